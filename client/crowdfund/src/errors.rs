//! Client-wide error types.

use thiserror::Error;

/// Message surfaced when a call needs a bearer token and none is stored.
pub const MISSING_TOKEN: &str = "Authentication token is missing";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the backend's own error text when it sent one.
    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{}", MISSING_TOKEN)]
    MissingToken,

    /// A required argument was absent; raised before any request is sent.
    #[error("{0}")]
    Precondition(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// HTTP status of the failed response, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Transport failures, rate limiting and 5xx answers may succeed on a
    /// later attempt; everything else will fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => !e.is_decode() && !e.is_builder(),
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Narrower than [`ClientError::is_retryable`]: only answers that say the
    /// request was turned away before any work was done. A lost response or a
    /// generic 5xx may mean the request was already acted on.
    pub fn was_not_processed(&self) -> bool {
        matches!(self, Self::Http { status: 429 | 503, .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
