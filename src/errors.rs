//! Error types for the reviewer client.
//!
//! Every failure is recoverable: callers surface it as a notification and the
//! session, form and file selection stay in a retryable state.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReviewerError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),
    #[error("Chat failed: {0}")]
    ChatFailed(String),
    #[error("File '{name}' is {size} bytes, larger than the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },
    #[error("No files selected")]
    NoFilesSelected,
    #[error("Storage write failed: {0}")]
    StorageWrite(String),
    #[error("Operation not allowed while session is {0}")]
    InvalidPhase(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<std::io::Error> for ReviewerError {
    fn from(err: std::io::Error) -> Self {
        ReviewerError::Io(err.to_string())
    }
}

impl From<ApiError> for ReviewerError {
    fn from(err: ApiError) -> Self {
        ReviewerError::Network(err.to_string())
    }
}

impl From<StoreError> for ReviewerError {
    fn from(err: StoreError) -> Self {
        ReviewerError::StorageWrite(err.to_string())
    }
}

/// Failures talking to the analysis backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Decode(String),
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Failures reported by a record or object store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    Rejected(String),
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReviewerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_lists_every_field() {
        let err = ReviewerError::MissingFields(vec!["project_id".into(), "grade".into()]);
        assert_eq!(err.to_string(), "Missing required fields: project_id, grade");
    }

    #[test]
    fn store_rejection_message_is_kept_verbatim() {
        let err: ReviewerError = StoreError::Rejected("ConditionalCheckFailed".into()).into();
        assert_eq!(err, ReviewerError::StorageWrite("ConditionalCheckFailed".into()));
    }
}
