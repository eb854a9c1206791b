pub mod api_client;
pub mod config_service;
pub mod file_collector;
pub mod file_service;
pub mod markdown_service;
pub mod repo_url;
pub mod session_service;
pub mod store_service;
pub mod submit_service;
