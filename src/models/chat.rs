use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    User,
    Bot,
}

/// Delivery state of a chat turn. User turns start out `Pending` and are
/// reconciled once their request resolves; bot turns are always `Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageStatus {
    Pending,
    Delivered,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub status: MessageStatus,
}

impl ChatMessage {
    pub fn user(text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::User,
            text: text.to_string(),
            status: MessageStatus::Pending,
        }
    }

    pub fn bot(text: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: Sender::Bot,
            text: text.to_string(),
            status: MessageStatus::Delivered,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Analyzing,
    Analyzed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Analyzing => "analyzing",
            SessionPhase::Analyzed => "analyzed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub repo_url: String,
    pub phase: SessionPhase,
    pub messages: Vec<ChatMessage>,
    pub pending_input: String,
    pub is_typing: bool,
}

impl SessionState {
    pub fn pending_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| m.is_pending())
    }
}
