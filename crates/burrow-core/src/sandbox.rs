//! Sandbox handle and the value types shared by both backends.

use crate::error::{CoreError, Result};
use crate::ops::{FileSystem, PortPreview, Process};
use burrow_api::WorkspaceState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Unique identifier for a sandbox.
///
/// Assigned by the orchestration API for remote sandboxes, or taken from the
/// container runtime for the local one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SandboxId(String);

impl SandboxId {
    /// Create a sandbox ID from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SandboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SandboxId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SandboxId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Current state of a sandbox.
///
/// Only remote sandboxes are ever `Stopped` or `Archived`; the local sandbox
/// is `Running` whenever a handle to it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    Running,
    Stopped,
    Archived,
    Unknown,
}

impl SandboxState {
    /// Whether a start request is required before the sandbox is usable.
    pub fn needs_start(&self) -> bool {
        matches!(self, Self::Stopped | Self::Archived)
    }
}

impl fmt::Display for SandboxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Archived => write!(f, "archived"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<WorkspaceState> for SandboxState {
    fn from(state: WorkspaceState) -> Self {
        match state {
            WorkspaceState::Started => Self::Running,
            WorkspaceState::Stopped => Self::Stopped,
            WorkspaceState::Archived => Self::Archived,
            _ => Self::Unknown,
        }
    }
}

/// Result of a one-shot command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Process exit code.
    pub exit_code: i32,
    /// Standard output followed by standard error.
    pub output: String,
}

impl ExecResult {
    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Handle for a command submitted into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCommand {
    /// Identifier to pass to `get_session_command_logs`.
    pub cmd_id: String,
    /// Exit code if known.
    ///
    /// The local backend always reports `Some(0)` because completion cannot
    /// be observed through the multiplexer; treat it as "submitted", not as
    /// a real exit status.
    pub exit_code: Option<i32>,
}

/// Unix permission bits in conventional octal notation, e.g. `"755"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permissions(String);

impl Permissions {
    /// Parse a 3 or 4 digit octal mode string.
    pub fn parse(mode: &str) -> Result<Self> {
        let mode = mode.trim();
        let valid_len = matches!(mode.len(), 3 | 4);
        if !valid_len || !mode.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(CoreError::InvalidInput(format!(
                "permissions must be a 3-4 digit octal string, got {mode:?}"
            )));
        }
        Ok(Self(mode.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self("755".to_string())
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Permissions {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A provisioned sandbox.
///
/// The handle is a composition of one [`Process`], one [`FileSystem`] and one
/// [`PortPreview`] implementation, all bound to the same underlying instance.
/// It does not own that instance; lifecycle is driven through the
/// [`Orchestrator`](crate::Orchestrator).
#[derive(Clone)]
pub struct Sandbox {
    id: SandboxId,
    state: SandboxState,
    remote_state: Option<WorkspaceState>,
    labels: HashMap<String, String>,
    created_at: Option<DateTime<Utc>>,
    process: Arc<dyn Process>,
    fs: Arc<dyn FileSystem>,
    preview: Arc<dyn PortPreview>,
}

impl Sandbox {
    pub(crate) fn new(
        id: SandboxId,
        state: SandboxState,
        process: Arc<dyn Process>,
        fs: Arc<dyn FileSystem>,
        preview: Arc<dyn PortPreview>,
    ) -> Self {
        Self {
            id,
            state,
            remote_state: None,
            labels: HashMap::new(),
            created_at: None,
            process,
            fs,
            preview,
        }
    }

    pub(crate) fn with_remote_state(mut self, state: WorkspaceState) -> Self {
        self.remote_state = Some(state);
        self
    }

    pub(crate) fn with_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.labels = labels;
        self
    }

    pub(crate) fn with_created_at(mut self, created_at: Option<DateTime<Utc>>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Get the sandbox ID.
    pub fn id(&self) -> &SandboxId {
        &self.id
    }

    /// State observed when this handle was produced.
    pub fn state(&self) -> SandboxState {
        self.state
    }

    /// State exactly as the orchestration API reported it.
    ///
    /// `None` for the local sandbox. Unlike [`state`](Self::state) this
    /// distinguishes `starting` from `error` or `destroyed`.
    pub fn remote_state(&self) -> Option<WorkspaceState> {
        self.remote_state
    }

    /// Labels attached at creation (always empty for the local sandbox).
    pub fn labels(&self) -> &HashMap<String, String> {
        &self.labels
    }

    /// Creation timestamp, when the backend reports one.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Process and session operations.
    pub fn process(&self) -> &dyn Process {
        self.process.as_ref()
    }

    /// Filesystem operations.
    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Public URL for a port exposed inside the sandbox.
    pub async fn get_preview_link(&self, port: u16) -> Result<String> {
        self.preview.preview_link(port).await
    }
}

impl fmt::Debug for Sandbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sandbox")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("remote_state", &self.remote_state)
            .field("labels", &self.labels)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
