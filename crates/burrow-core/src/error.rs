//! Error types for burrow-core.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for burrow-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur during sandbox operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Error from the remote orchestration API
    #[error("orchestration API error: {0}")]
    Api(#[from] burrow_api::ApiError),

    /// An external program could not be spawned or waited on
    #[error("failed to run {program}: {message}")]
    Command {
        /// Program that was invoked
        program: String,
        /// Underlying failure
        message: String,
    },

    /// An external program exited with a non-zero status
    #[error("command `{command}` exited with {code}: {stderr}")]
    CommandFailed {
        /// Rendered command line
        command: String,
        /// Exit code (-1 if killed by a signal)
        code: i32,
        /// Captured standard error
        stderr: String,
    },

    /// A one-shot command did not finish in time
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// Sandbox is not in the state the operation requires
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },

    /// Caller supplied a malformed argument
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Check if this error is a one-shot execution timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CoreError::Timeout(_))
    }

    /// Check if this error indicates the sandbox does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::Api(e) if e.is_not_found())
    }
}
