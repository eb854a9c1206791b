//! UI-facing commands. Each command runs one operation and turns any failure
//! into a [`Notification`](crate::models::Notification) for the user.

mod chat;
mod files;
mod projects;
mod state;

pub use chat::*;
pub use files::*;
pub use projects::*;
pub use state::*;
