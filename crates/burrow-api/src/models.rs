//! Request and response types for the orchestration API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Lifecycle state of a remote workspace as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceState {
    Creating,
    Starting,
    Started,
    Stopping,
    Stopped,
    Archiving,
    Archived,
    Destroying,
    Destroyed,
    Error,
    /// Anything this client does not recognize.
    #[default]
    #[serde(other)]
    Unknown,
}

impl WorkspaceState {
    /// Whether the workspace has to be started before it can be used.
    pub fn is_stopped_or_archived(&self) -> bool {
        matches!(self, Self::Stopped | Self::Archived)
    }

    /// Whether the workspace is up and accepting toolbox calls.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Started)
    }

    /// Whether the workspace may still settle into `started` on its own.
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Creating | Self::Starting | Self::Unknown)
    }
}

impl fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Creating => "creating",
            Self::Starting => "starting",
            Self::Started => "started",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Archiving => "archiving",
            Self::Archived => "archived",
            Self::Destroying => "destroying",
            Self::Destroyed => "destroyed",
            Self::Error => "error",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A remote workspace record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// API-assigned identifier.
    pub id: String,
    #[serde(default)]
    pub state: WorkspaceState,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body for `POST /workspace`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkspaceRequest {
    pub image: String,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    pub env: HashMap<String, String>,
    /// CPU cores.
    pub cpu: u32,
    /// Memory in GB.
    pub memory: u32,
    /// Disk in GB.
    pub disk: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Body for a one-shot toolbox command.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub command: String,
    /// Timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Result of a one-shot toolbox command.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    pub exit_code: i32,
    /// Combined stdout and stderr.
    #[serde(default)]
    pub result: String,
}

/// Body for submitting a command into a session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExecuteRequest {
    pub command: String,
    #[serde(rename = "async")]
    pub run_async: bool,
}

/// Handle for a command submitted into a session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExecuteResponse {
    pub cmd_id: String,
    #[serde(default)]
    pub output: Option<String>,
    /// Absent while an async command is still running.
    #[serde(default)]
    pub exit_code: Option<i32>,
}

/// Public URL for an exposed port.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewUrl {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_state_parsing() {
        let ws: Workspace =
            serde_json::from_str(r#"{"id":"sb-1","state":"stopped"}"#).expect("valid json");
        assert_eq!(ws.state, WorkspaceState::Stopped);
        assert!(ws.state.is_stopped_or_archived());
        assert!(ws.labels.is_empty());
    }

    #[test]
    fn test_unrecognized_state_is_unknown() {
        let ws: Workspace =
            serde_json::from_str(r#"{"id":"sb-1","state":"pulling_image"}"#).expect("valid json");
        assert_eq!(ws.state, WorkspaceState::Unknown);
        assert!(!ws.state.is_running());
    }

    #[test]
    fn test_missing_state_defaults_to_unknown() {
        let ws: Workspace = serde_json::from_str(r#"{"id":"sb-2"}"#).expect("valid json");
        assert_eq!(ws.state, WorkspaceState::Unknown);
    }

    #[test]
    fn test_transitional_states() {
        assert!(WorkspaceState::Starting.is_transitional());
        assert!(WorkspaceState::Creating.is_transitional());
        assert!(WorkspaceState::Unknown.is_transitional());
        assert!(!WorkspaceState::Error.is_transitional());
        assert!(!WorkspaceState::Destroyed.is_transitional());
        assert!(!WorkspaceState::Destroying.is_transitional());
        assert!(!WorkspaceState::Stopped.is_transitional());
    }

    #[test]
    fn test_create_request_shape() {
        let req = CreateWorkspaceRequest {
            image: "kortix/suna:0.1".into(),
            public: true,
            labels: None,
            env: HashMap::from([("VNC_PASSWORD".to_string(), "pw".to_string())]),
            cpu: 2,
            memory: 4,
            disk: 5,
            target: Some("us".into()),
        };
        let json = serde_json::to_value(&req).expect("serializable");
        assert_eq!(json["image"], "kortix/suna:0.1");
        assert_eq!(json["public"], true);
        assert_eq!(json["env"]["VNC_PASSWORD"], "pw");
        assert_eq!(json["cpu"], 2);
        assert!(json.get("labels").is_none());
    }

    #[test]
    fn test_session_execute_request_uses_async_key() {
        let req = SessionExecuteRequest {
            command: "echo hi".into(),
            run_async: true,
        };
        let json = serde_json::to_value(&req).expect("serializable");
        assert_eq!(json["async"], true);
        assert_eq!(json["command"], "echo hi");
    }

    #[test]
    fn test_session_execute_response_without_exit_code() {
        let resp: SessionExecuteResponse =
            serde_json::from_str(r#"{"cmdId":"c-1"}"#).expect("valid json");
        assert_eq!(resp.cmd_id, "c-1");
        assert!(resp.exit_code.is_none());
    }
}
