//! Capability traits every backend implements.
//!
//! A [`Sandbox`](crate::Sandbox) holds these as trait objects, so callers
//! never see which backend is behind a handle.

use crate::error::Result;
use crate::sandbox::{ExecResult, Permissions, SessionCommand};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// One-shot commands and long-lived interactive sessions.
#[async_trait]
pub trait Process: Send + Sync {
    /// Run a shell command and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Timeout`](crate::CoreError::Timeout) if the
    /// command is still running when `timeout` elapses.
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecResult>;

    /// Start a named session. Creating a session that already exists is not
    /// an error.
    async fn create_session(&self, session_id: &str) -> Result<()>;

    /// Terminate a named session. No-op if it does not exist.
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Submit a command into a session's input stream.
    ///
    /// With `run_async` the call returns as soon as the command is accepted.
    /// Session commands have no timeout; they run until they exit or the
    /// session is deleted.
    async fn execute_session_command(
        &self,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<SessionCommand>;

    /// Accumulated output for a session command.
    async fn get_session_command_logs(&self, session_id: &str, command_id: &str)
        -> Result<String>;
}

/// File transfer and permission management inside a sandbox.
///
/// Calls are independent; a failure partway through a multi-step caller
/// workflow leaves earlier steps applied.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Create a directory (and parents) with the given mode. Idempotent.
    async fn create_folder(&self, path: &str, permissions: &Permissions) -> Result<()>;

    /// Write `data` to `path`, replacing any existing content.
    async fn upload_file(&self, path: &str, data: Bytes) -> Result<()>;

    /// Read the full content of `path`.
    async fn download_file(&self, path: &str) -> Result<Bytes>;

    async fn delete_file(&self, path: &str) -> Result<()>;

    async fn set_file_permissions(&self, path: &str, permissions: &Permissions) -> Result<()>;
}

/// Resolves externally reachable URLs for ports inside a sandbox.
#[async_trait]
pub trait PortPreview: Send + Sync {
    async fn preview_link(&self, port: u16) -> Result<String>;
}
