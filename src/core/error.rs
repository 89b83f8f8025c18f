use thiserror::Error;

use crate::core::message::Message;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid topic name: {0}")]
    InvalidTopic(String),

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status. Displays exactly the trimmed response body.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("message queue is closed")]
    QueueClosed,

    #[error("subscription canceled")]
    Canceled,

    #[error("subscribe must be called from within a Tokio runtime")]
    NoRuntime,
}

impl ClientError {
    /// Validation errors are raised before any network I/O and are never retried.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::InvalidTopic(_) | ClientError::InvalidOption(_))
    }
}

/// Failure of a one-shot poll, together with whatever arrived before it.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct PollError {
    pub messages: Vec<Message>,
    #[source]
    pub error: ClientError,
}

impl From<ClientError> for PollError {
    fn from(error: ClientError) -> Self {
        Self {
            messages: Vec::new(),
            error,
        }
    }
}
