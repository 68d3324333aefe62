//! Tool parameter and response types for MCP tools.
//!
//! These types use serde for serialization and schemars for automatic
//! JSON Schema generation required by MCP.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Sandbox Lifecycle
// ============================================================================

/// Parameters for creating a new sandbox.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CreateSandboxParams {
    /// Display-access (VNC) password. Generated when omitted.
    #[serde(default)]
    pub password: Option<String>,

    /// Project the sandbox belongs to; stored as the `id` label.
    #[serde(default)]
    pub project_id: Option<String>,
}

/// Parameters for tools that only need a sandbox.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SandboxIdParams {
    /// ID of the sandbox.
    pub sandbox_id: String,
}

/// Information about a sandbox.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SandboxInfo {
    /// Unique identifier for the sandbox.
    pub sandbox_id: String,
    /// Current state of the sandbox.
    pub state: String,
    /// Labels attached at creation.
    pub labels: HashMap<String, String>,
    /// When the sandbox was created (RFC 3339), if known.
    pub created_at: Option<String>,
}

/// Result of creating a sandbox.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateSandboxResult {
    #[serde(flatten)]
    pub sandbox: SandboxInfo,
    /// Display-access password the sandbox was created with.
    pub password: String,
}

/// Generic success flag.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SuccessResult {
    /// Whether the operation succeeded.
    pub success: bool,
}

// ============================================================================
// Process and Sessions
// ============================================================================

/// Parameters for running a one-shot shell command.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteParams {
    /// ID of the sandbox to execute in.
    pub sandbox_id: String,

    /// Shell command to execute.
    pub command: String,

    /// Timeout in seconds (default: 60).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Result of a one-shot command.
#[derive(Debug, Serialize, JsonSchema)]
pub struct ExecResponse {
    /// Exit code of the command (0 = success).
    pub exit_code: i32,

    /// Standard output followed by standard error.
    pub output: String,
}

/// Parameters for creating or deleting a session.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Caller-chosen session name, unique within the sandbox.
    pub session_id: String,
}

/// Parameters for submitting a command into a session.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionCommandParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Session to submit into.
    pub session_id: String,

    /// Command text.
    pub command: String,

    /// Return without waiting for the command (default: false).
    #[serde(default)]
    pub run_async: bool,
}

/// Handle for a submitted session command.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionCommandResult {
    /// Pass to `get_session_command_logs`.
    pub cmd_id: String,

    /// Exit code, if known. The local backend always reports 0.
    pub exit_code: Option<i32>,
}

/// Parameters for reading session output.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionLogsParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Session the command was submitted to.
    pub session_id: String,

    /// Command handle returned by `execute_session_command`.
    pub command_id: String,
}

/// Accumulated session output.
#[derive(Debug, Serialize, JsonSchema)]
pub struct SessionLogsResult {
    pub logs: String,
}

// ============================================================================
// File Operations
// ============================================================================

/// Parameters for creating a directory.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFolderParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Absolute path of the directory.
    pub path: String,

    /// Octal mode, e.g. "755" (default: "755").
    #[serde(default)]
    pub permissions: Option<String>,
}

/// How file content is carried in tool arguments and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContentEncoding {
    /// Plain UTF-8 text.
    #[default]
    Utf8,
    /// Standard base64, for binary content.
    Base64,
}

/// Parameters for writing a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct UploadFileParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Absolute path to the file.
    pub path: String,

    /// Content to write.
    pub content: String,

    /// Encoding of `content` (default: "utf8").
    #[serde(default)]
    pub encoding: ContentEncoding,
}

/// Parameters for reading a file.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DownloadFileParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Absolute path to the file.
    pub path: String,

    /// Preferred encoding of the returned content (default: "utf8").
    /// Files that are not valid UTF-8 always come back as base64.
    #[serde(default)]
    pub encoding: ContentEncoding,
}

/// Parameters for tools that act on one path.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PathParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Absolute path to the file.
    pub path: String,
}

/// Result of reading a file.
#[derive(Debug, Serialize, JsonSchema)]
pub struct DownloadFileResult {
    /// File contents, encoded as `encoding` says.
    pub content: String,

    /// Encoding actually used for `content`.
    pub encoding: ContentEncoding,

    /// Size in bytes.
    pub size: usize,
}

/// Parameters for changing a file's mode.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetPermissionsParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Absolute path to the file.
    pub path: String,

    /// Octal mode, e.g. "644".
    pub permissions: String,
}

// ============================================================================
// Preview
// ============================================================================

/// Parameters for resolving a preview URL.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct PreviewLinkParams {
    /// ID of the sandbox.
    pub sandbox_id: String,

    /// Port exposed inside the sandbox.
    pub port: u16,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PreviewLinkResult {
    pub url: String,
}
