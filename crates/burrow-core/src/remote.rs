//! Remote backend - sandboxes provisioned through the orchestration API.
//!
//! Remote sandboxes outlive the process and are fetched by ID on every
//! lifecycle call. Every API failure is logged and returned; nothing here
//! degrades silently, because remote state must be trusted for correctness.

use crate::config::{sandbox_env, CreateParams, Resources, SandboxSettings};
use crate::error::{CoreError, Result};
use crate::ops::{FileSystem, PortPreview, Process};
use crate::sandbox::{ExecResult, Permissions, Sandbox, SandboxId, SandboxState, SessionCommand};
use async_trait::async_trait;
use burrow_api::{
    ApiConfig, ApiError, CreateWorkspaceRequest, ExecuteRequest, HttpOrchestrationClient,
    OrchestrationApi, SessionExecuteRequest, Workspace,
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Adapter from the orchestration API to the sandbox contract.
#[derive(Clone)]
pub struct RemoteBackend {
    api: Arc<dyn OrchestrationApi>,
    image: String,
    resources: Resources,
}

impl RemoteBackend {
    /// Wrap an API client.
    pub fn new(api: Arc<dyn OrchestrationApi>, image: impl Into<String>, resources: Resources) -> Self {
        Self {
            api,
            image: image.into(),
            resources,
        }
    }

    /// Build an HTTP client from settings and wrap it.
    pub fn from_settings(settings: &SandboxSettings) -> Result<Self> {
        let api_key = settings.api_key.clone().unwrap_or_default();
        let config = ApiConfig::new(api_key, settings.resolved_server_url())
            .with_target(settings.resolved_target());
        let client = HttpOrchestrationClient::new(config)?;
        tracing::debug!("Remote backend client initialized");
        Ok(Self::new(
            Arc::new(client),
            settings.image.clone(),
            settings.resources,
        ))
    }

    /// Fetch the current state of a sandbox.
    #[tracing::instrument(level = "debug", skip(self), fields(sandbox_id = %id))]
    pub async fn get(&self, id: &SandboxId) -> Result<Sandbox> {
        let workspace = self.api.get_workspace(id.as_str()).await.map_err(|e| {
            tracing::error!(sandbox_id = %id, error = %e, "Failed to fetch sandbox");
            CoreError::from(e)
        })?;
        tracing::debug!(sandbox_id = %id, state = %workspace.state, "Fetched sandbox");
        Ok(self.handle(workspace))
    }

    /// Provision a new sandbox.
    #[tracing::instrument(level = "info", skip(self, params), fields(image = %self.image))]
    pub async fn create(&self, params: &CreateParams) -> Result<Sandbox> {
        let labels = params.labels();
        if let Some(project_id) = &params.project_id {
            tracing::debug!(project_id = %project_id, "Labelling sandbox with project id");
        }

        let request = CreateWorkspaceRequest {
            image: self.image.clone(),
            public: true,
            labels,
            env: sandbox_env(&params.password),
            cpu: self.resources.cpu,
            memory: self.resources.memory,
            disk: self.resources.disk,
            target: None,
        };

        let workspace = self.api.create_workspace(&request).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create sandbox");
            CoreError::from(e)
        })?;
        tracing::info!(sandbox_id = %workspace.id, "Sandbox created");
        Ok(self.handle(workspace))
    }

    /// Request a stopped or archived sandbox to start.
    ///
    /// The transition completes asynchronously; callers must re-fetch.
    #[tracing::instrument(level = "info", skip(self, sandbox), fields(sandbox_id = %sandbox.id()))]
    pub async fn start(&self, sandbox: &Sandbox) -> Result<()> {
        self.api
            .start_workspace(sandbox.id().as_str())
            .await
            .map_err(|e| {
                tracing::error!(sandbox_id = %sandbox.id(), error = %e, "Failed to start sandbox");
                CoreError::from(e)
            })
    }

    /// Delete a sandbox permanently.
    #[tracing::instrument(level = "info", skip(self, sandbox), fields(sandbox_id = %sandbox.id()))]
    pub async fn remove(&self, sandbox: &Sandbox) -> Result<()> {
        self.api
            .remove_workspace(sandbox.id().as_str())
            .await
            .map_err(|e| {
                tracing::error!(sandbox_id = %sandbox.id(), error = %e, "Failed to remove sandbox");
                CoreError::from(e)
            })
    }

    fn handle(&self, workspace: Workspace) -> Sandbox {
        let toolbox = Arc::new(RemoteToolbox {
            api: Arc::clone(&self.api),
            id: workspace.id.clone(),
        });
        Sandbox::new(
            SandboxId::new(workspace.id),
            SandboxState::from(workspace.state),
            toolbox.clone(),
            toolbox.clone(),
            toolbox,
        )
        .with_remote_state(workspace.state)
        .with_labels(workspace.labels)
        .with_created_at(workspace.created_at)
    }
}

/// Process, filesystem and preview operations for one remote sandbox.
struct RemoteToolbox {
    api: Arc<dyn OrchestrationApi>,
    id: String,
}

impl RemoteToolbox {
    fn log_failure(&self, op: &str, err: ApiError) -> CoreError {
        tracing::error!(sandbox_id = %self.id, op, error = %err, "Remote toolbox call failed");
        CoreError::from(err)
    }
}

#[async_trait]
impl Process for RemoteToolbox {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecResult> {
        let request = ExecuteRequest {
            command: command.to_string(),
            timeout: Some(timeout.as_secs().max(1)),
        };
        let response = tokio::time::timeout(timeout, self.api.execute(&self.id, &request))
            .await
            .map_err(|_| {
                tracing::warn!(sandbox_id = %self.id, ?timeout, "Remote command timed out");
                CoreError::Timeout(timeout)
            })?
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!(sandbox_id = %self.id, ?timeout, error = %e, "Remote command request timed out");
                    CoreError::Timeout(timeout)
                } else {
                    self.log_failure("execute", e)
                }
            })?;

        Ok(ExecResult {
            exit_code: response.exit_code,
            output: response.result,
        })
    }

    async fn create_session(&self, session_id: &str) -> Result<()> {
        match self.api.create_session(&self.id, session_id).await {
            Ok(()) => Ok(()),
            Err(ApiError::Status { status: 409, .. }) => {
                tracing::debug!(sandbox_id = %self.id, session_id, "Session already exists");
                Ok(())
            }
            Err(e) => Err(self.log_failure("create_session", e)),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        match self.api.delete_session(&self.id, session_id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                tracing::debug!(sandbox_id = %self.id, session_id, "Session already gone");
                Ok(())
            }
            Err(e) => Err(self.log_failure("delete_session", e)),
        }
    }

    async fn execute_session_command(
        &self,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<SessionCommand> {
        let request = SessionExecuteRequest {
            command: command.to_string(),
            run_async,
        };
        let response = self
            .api
            .execute_session_command(&self.id, session_id, &request)
            .await
            .map_err(|e| self.log_failure("execute_session_command", e))?;

        Ok(SessionCommand {
            cmd_id: response.cmd_id,
            exit_code: response.exit_code,
        })
    }

    async fn get_session_command_logs(
        &self,
        session_id: &str,
        command_id: &str,
    ) -> Result<String> {
        self.api
            .get_session_command_logs(&self.id, session_id, command_id)
            .await
            .map_err(|e| self.log_failure("get_session_command_logs", e))
    }
}

#[async_trait]
impl FileSystem for RemoteToolbox {
    async fn create_folder(&self, path: &str, permissions: &Permissions) -> Result<()> {
        self.api
            .create_folder(&self.id, path, permissions.as_str())
            .await
            .map_err(|e| self.log_failure("create_folder", e))
    }

    async fn upload_file(&self, path: &str, data: Bytes) -> Result<()> {
        self.api
            .upload_file(&self.id, path, data)
            .await
            .map_err(|e| self.log_failure("upload_file", e))
    }

    async fn download_file(&self, path: &str) -> Result<Bytes> {
        self.api
            .download_file(&self.id, path)
            .await
            .map_err(|e| self.log_failure("download_file", e))
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.api
            .delete_file(&self.id, path)
            .await
            .map_err(|e| self.log_failure("delete_file", e))
    }

    async fn set_file_permissions(&self, path: &str, permissions: &Permissions) -> Result<()> {
        self.api
            .set_file_permissions(&self.id, path, permissions.as_str())
            .await
            .map_err(|e| self.log_failure("set_file_permissions", e))
    }
}

#[async_trait]
impl PortPreview for RemoteToolbox {
    async fn preview_link(&self, port: u16) -> Result<String> {
        self.api
            .preview_url(&self.id, port)
            .await
            .map_err(|e| self.log_failure("preview_url", e))
    }
}
