use serde::{Deserialize, Serialize};

use crate::errors::ReviewerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationVariant {
    Default,
    Destructive,
}

/// Transient user-visible message produced by a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    pub fn success(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Default,
        }
    }

    pub fn failure(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NotificationVariant::Destructive,
        }
    }
}

impl From<&ReviewerError> for Notification {
    fn from(err: &ReviewerError) -> Self {
        match err {
            ReviewerError::InvalidRepoUrl(_) => Notification::failure(
                "Invalid GitHub URL",
                "Please enter a valid GitHub repository URL (e.g., https://github.com/username/repo)",
            ),
            ReviewerError::Validation(msg) => Notification::failure("Invalid Input", msg),
            ReviewerError::MissingFields(_) => {
                Notification::failure("Missing Fields", "Please fill in all required fields")
            }
            ReviewerError::NoFilesSelected => Notification::failure(
                "No Files Selected",
                "Please select at least one file to upload",
            ),
            ReviewerError::FileTooLarge { name, limit, .. } => Notification::failure(
                "File Too Large",
                &format!("{} exceeds the {} MiB limit", name, limit / (1024 * 1024)),
            ),
            ReviewerError::AnalysisFailed(msg) => Notification::failure("Analysis Failed", msg),
            ReviewerError::ChatFailed(msg) | ReviewerError::StorageWrite(msg) => {
                Notification::failure("Error", msg)
            }
            other => Notification::failure("Error", &other.to_string()),
        }
    }
}

impl From<ReviewerError> for Notification {
    fn from(err: ReviewerError) -> Self {
        Notification::from(&err)
    }
}
