pub mod commands;
pub mod errors;
pub mod models;
pub mod services;

pub use errors::{ApiError, Result, ReviewerError, StoreError};
pub use services::config_service::{load_config, Config};
