//! Error types for burrow-api.

use thiserror::Error;

/// Result type alias for orchestration API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the orchestration API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as text
        body: String,
    },

    /// The requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client could not be configured.
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Check if this error indicates a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Check if the HTTP request itself ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Http(e) if e.is_timeout())
    }
}
