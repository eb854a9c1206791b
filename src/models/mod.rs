mod chat;
mod file;
mod notification;
mod project;
mod rendered;

pub use chat::*;
pub use file::*;
pub use notification::*;
pub use project::*;
pub use rendered::*;
