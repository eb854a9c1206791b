use crate::commands::AppState;
use crate::models::{Notification, RenderedMessage, SessionState};

pub async fn analyze_repository(state: &mut AppState, repo_url: &str) -> Result<Notification, Notification> {
    state.session.start_analysis(repo_url).await?;
    Ok(Notification::success(
        "Repository Analyzed",
        "The project has been successfully analyzed. You can now ask questions about it.",
    ))
}

pub fn set_chat_input(state: &mut AppState, text: &str) {
    state.session.set_input(text);
}

/// Sends the current chat input.
pub async fn send_chat_input(state: &mut AppState) -> Result<(), Notification> {
    let text = state.session.state().pending_input.clone();
    send_chat_message(state, &text).await
}

pub async fn send_chat_message(state: &mut AppState, message: &str) -> Result<(), Notification> {
    state.session.send_message(message).await?;
    Ok(())
}

pub fn new_session(state: &mut AppState) {
    state.session.reset();
}

pub fn get_session(state: &AppState) -> SessionState {
    state.session.state().clone()
}

pub fn render_message(state: &AppState, text: &str) -> RenderedMessage {
    state.renderer.render(text)
}
