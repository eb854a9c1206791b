//! Analysis/chat session controller.
//!
//! The controller owns the [`SessionState`] and is the only place it is
//! mutated. Every network-backed operation comes in two halves: `begin_*`
//! applies the optimistic state change and hands back a ticket, `complete_*`
//! reconciles the state with the outcome of the request. Hosts that must not
//! block on the network drive the halves themselves; everyone else calls the
//! `async` convenience wrappers.

use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{ApiError, Result, ReviewerError};
use crate::models::{ChatMessage, MessageStatus, SessionPhase, SessionState};
use crate::services::api_client::ReviewApi;
use crate::services::repo_url::{is_valid_repo_url, is_valid_repo_url_for_host};

pub const CHAT_FALLBACK_MESSAGE: &str =
    "Sorry, I encountered an error while processing your question. Please try again.";

/// Ticket for an outstanding analyze request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAnalysis {
    generation: u64,
    pub repo_url: String,
}

/// Ticket for an outstanding chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    generation: u64,
    pub message_id: Uuid,
    pub repo_url: String,
    pub message: String,
}

/// What a `complete_*` call did with its ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The ticket was superseded by a newer analysis or a reset; state is untouched.
    Discarded,
}

pub struct SessionController {
    api: Arc<dyn ReviewApi>,
    allowed_host: Option<String>,
    state: SessionState,
    // Bumped by every analysis start and every reset; tickets from an older
    // generation are discarded on completion.
    generation: u64,
    chats_in_flight: usize,
}

impl SessionController {
    pub fn new(api: Arc<dyn ReviewApi>) -> Self {
        Self {
            api,
            allowed_host: None,
            state: SessionState::default(),
            generation: 0,
            chats_in_flight: 0,
        }
    }

    pub fn with_allowed_host(mut self, host: Option<String>) -> Self {
        self.allowed_host = host;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    pub fn is_valid_url(&self, url: &str) -> bool {
        match &self.allowed_host {
            Some(host) => is_valid_repo_url_for_host(url, host),
            None => is_valid_repo_url(url),
        }
    }

    /// Mirrors the chat input box.
    pub fn set_input(&mut self, text: &str) {
        self.state.pending_input = text.to_string();
    }

    /// Drops the current session and starts over from idle.
    pub fn reset(&mut self) {
        log::info!("Resetting session for {}", self.state.repo_url);
        self.state = SessionState::default();
        self.generation += 1;
        self.chats_in_flight = 0;
    }

    pub fn begin_analysis(&mut self, url: &str) -> Result<PendingAnalysis> {
        if !self.is_valid_url(url) {
            log::warn!("Rejected repository URL {:?}", url);
            return Err(ReviewerError::InvalidRepoUrl(url.to_string()));
        }
        if self.state.phase == SessionPhase::Analyzed {
            return Err(ReviewerError::InvalidPhase(self.state.phase.to_string()));
        }

        self.generation += 1;
        self.state.repo_url = url.to_string();
        self.state.phase = SessionPhase::Analyzing;
        log::info!("Analyzing {}", url);

        Ok(PendingAnalysis {
            generation: self.generation,
            repo_url: url.to_string(),
        })
    }

    pub fn complete_analysis(
        &mut self,
        pending: PendingAnalysis,
        outcome: std::result::Result<String, ApiError>,
    ) -> Result<Completion> {
        if pending.generation != self.generation || self.state.phase != SessionPhase::Analyzing {
            log::info!("Discarding stale analysis result for {}", pending.repo_url);
            return Ok(Completion::Discarded);
        }

        match outcome {
            Ok(response) => {
                self.state.messages = vec![ChatMessage::bot(&response)];
                self.state.phase = SessionPhase::Analyzed;
                log::info!("Analysis of {} complete", pending.repo_url);
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.state.phase = SessionPhase::Idle;
                log::error!("Analysis of {} failed: {}", pending.repo_url, e);
                Err(ReviewerError::AnalysisFailed(e.to_string()))
            }
        }
    }

    pub async fn start_analysis(&mut self, url: &str) -> Result<()> {
        let pending = self.begin_analysis(url)?;
        let api = Arc::clone(&self.api);
        let outcome = api.analyze(&pending.repo_url).await;
        self.complete_analysis(pending, outcome).map(|_| ())
    }

    /// Appends the user's turn as pending. Returns `None` for blank input,
    /// leaving the session untouched.
    pub fn begin_send(&mut self, text: &str) -> Result<Option<PendingChat>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        if self.state.phase != SessionPhase::Analyzed {
            return Err(ReviewerError::InvalidPhase(self.state.phase.to_string()));
        }

        let message = ChatMessage::user(text);
        let message_id = message.id;
        self.state.messages.push(message);
        self.state.pending_input.clear();
        self.chats_in_flight += 1;
        self.state.is_typing = true;
        log::debug!("Sending chat message {}", message_id);

        Ok(Some(PendingChat {
            generation: self.generation,
            message_id,
            repo_url: self.state.repo_url.clone(),
            message: text.to_string(),
        }))
    }

    pub fn complete_send(
        &mut self,
        pending: PendingChat,
        outcome: std::result::Result<String, ApiError>,
    ) -> Result<Completion> {
        if pending.generation != self.generation {
            log::info!("Discarding chat reply {} from a previous session", pending.message_id);
            return Ok(Completion::Discarded);
        }

        self.chats_in_flight = self.chats_in_flight.saturating_sub(1);
        self.state.is_typing = self.chats_in_flight > 0;

        let status = if outcome.is_ok() {
            MessageStatus::Delivered
        } else {
            MessageStatus::Failed
        };
        if let Some(message) = self
            .state
            .messages
            .iter_mut()
            .find(|m| m.id == pending.message_id)
        {
            message.status = status;
        }

        match outcome {
            Ok(response) => {
                self.state.messages.push(ChatMessage::bot(&response));
                Ok(Completion::Applied)
            }
            Err(e) => {
                log::error!("Chat request {} failed: {}", pending.message_id, e);
                self.state.messages.push(ChatMessage::bot(CHAT_FALLBACK_MESSAGE));
                Err(ReviewerError::ChatFailed(e.to_string()))
            }
        }
    }

    pub async fn send_message(&mut self, text: &str) -> Result<()> {
        let Some(pending) = self.begin_send(text)? else {
            return Ok(());
        };
        let api = Arc::clone(&self.api);
        let outcome = api.chat(&pending.repo_url, &pending.message).await;
        self.complete_send(pending, outcome).map(|_| ())
    }
}
