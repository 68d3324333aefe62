//! Errors raised while handling a tool call.

use burrow_core::CoreError;
use thiserror::Error;

/// Failure of a single tool call. Reported back to the client as an error
/// result, never as a protocol error.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("{field} exceeds maximum size ({size} bytes > {max} bytes)")]
    TooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Sandbox(#[from] CoreError),
}
