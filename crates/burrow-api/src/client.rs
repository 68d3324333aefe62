//! HTTP client for the remote orchestration API.
//!
//! Workspace lifecycle lives under `/workspace`, while process and
//! filesystem operations go through the per-workspace toolbox proxy at
//! `/toolbox/{id}/toolbox/...`.

use crate::error::{ApiError, Result};
use crate::models::{
    CreateWorkspaceRequest, ExecuteRequest, ExecuteResponse, PreviewUrl, SessionExecuteRequest,
    SessionExecuteResponse, Workspace,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Slack added on top of a command's own timeout for the execute request,
/// so the caller's deadline expires before the transport gives up.
const EXECUTE_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Operations the orchestration API exposes.
///
/// This is the seam between Burrow and the remote service; tests swap in an
/// in-memory implementation.
#[async_trait]
pub trait OrchestrationApi: Send + Sync {
    /// Fetch a workspace by ID.
    async fn get_workspace(&self, id: &str) -> Result<Workspace>;

    /// Provision a new workspace.
    async fn create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<Workspace>;

    /// Request a stopped or archived workspace to start.
    ///
    /// The transition is asynchronous on the remote side; re-fetch the
    /// workspace to observe the new state.
    async fn start_workspace(&self, id: &str) -> Result<()>;

    /// Permanently delete a workspace.
    async fn remove_workspace(&self, id: &str) -> Result<()>;

    /// Run a one-shot command.
    async fn execute(&self, id: &str, request: &ExecuteRequest) -> Result<ExecuteResponse>;

    async fn create_session(&self, id: &str, session_id: &str) -> Result<()>;

    async fn delete_session(&self, id: &str, session_id: &str) -> Result<()>;

    async fn execute_session_command(
        &self,
        id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> Result<SessionExecuteResponse>;

    async fn get_session_command_logs(
        &self,
        id: &str,
        session_id: &str,
        command_id: &str,
    ) -> Result<String>;

    async fn create_folder(&self, id: &str, path: &str, mode: &str) -> Result<()>;

    async fn upload_file(&self, id: &str, path: &str, data: Bytes) -> Result<()>;

    async fn download_file(&self, id: &str, path: &str) -> Result<Bytes>;

    async fn delete_file(&self, id: &str, path: &str) -> Result<()>;

    async fn set_file_permissions(&self, id: &str, path: &str, mode: &str) -> Result<()>;

    /// Resolve the public URL for a port exposed by the workspace.
    async fn preview_url(&self, id: &str, port: u16) -> Result<String>;
}

/// Connection settings for [`HttpOrchestrationClient`].
#[derive(Clone)]
pub struct ApiConfig {
    /// Bearer token.
    pub api_key: String,
    /// Base URL, e.g. `https://app.daytona.io/api`.
    pub server_url: String,
    /// Region or runner pool new workspaces are placed in.
    pub target: Option<String>,
    /// Timeout applied to every HTTP request, except `execute` calls that
    /// carry their own command timeout.
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Create a config with the default timeout and no target.
    pub fn new(api_key: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_url: server_url.into(),
            target: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the placement target.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("server_url", &self.server_url)
            .field("target", &self.target)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// reqwest-backed implementation of [`OrchestrationApi`].
#[derive(Debug, Clone)]
pub struct HttpOrchestrationClient {
    http: Client,
    base_url: String,
    api_key: String,
    target: Option<String>,
}

impl HttpOrchestrationClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the key or URL is blank, or if the
    /// underlying HTTP client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ApiError::Config("api_key is required".into()));
        }
        if config.server_url.trim().is_empty() {
            return Err(ApiError::Config("server_url is required".into()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        tracing::debug!(
            server_url = %config.server_url,
            target = ?config.target,
            "Orchestration client initialized"
        );

        Ok(Self {
            http,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            target: config.target,
        })
    }

    /// Placement target this client was configured with.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    fn workspace_url(&self, id: &str) -> String {
        format!("{}/workspace/{id}", self.base_url)
    }

    fn toolbox_url(&self, id: &str, rest: &str) -> String {
        format!("{}/toolbox/{id}/toolbox/{rest}", self.base_url)
    }

    /// Send a request and turn non-success statuses into errors.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let resp = request.bearer_auth(&self.api_key).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let url = resp.url().to_string();
        let body = resp.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), url = %url, body = %body, "API call failed");
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let resp = self.send(request).await?;
        let bytes = resp.bytes().await?;
        tracing::trace!(body = %String::from_utf8_lossy(&bytes), "API response body");
        serde_json::from_slice(&bytes).map_err(ApiError::from)
    }
}

#[async_trait]
impl OrchestrationApi for HttpOrchestrationClient {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_workspace(&self, id: &str) -> Result<Workspace> {
        self.send_json(self.http.get(self.workspace_url(id))).await
    }

    #[tracing::instrument(level = "debug", skip(self, request), fields(image = %request.image))]
    async fn create_workspace(&self, request: &CreateWorkspaceRequest) -> Result<Workspace> {
        let mut body = request.clone();
        if body.target.is_none() {
            body.target = self.target.clone();
        }
        let url = format!("{}/workspace", self.base_url);
        self.send_json(self.http.post(url).json(&body)).await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn start_workspace(&self, id: &str) -> Result<()> {
        let url = format!("{}/start", self.workspace_url(id));
        self.send(self.http.post(url)).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn remove_workspace(&self, id: &str) -> Result<()> {
        let request = self
            .http
            .delete(self.workspace_url(id))
            .query(&[("force", "true")]);
        self.send(request).await?;
        Ok(())
    }

    async fn execute(&self, id: &str, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        tracing::debug!(workspace = %id, command = %request.command, "Executing toolbox command");
        let url = self.toolbox_url(id, "process/execute");
        let mut builder = self.http.post(url).json(request);
        if let Some(secs) = request.timeout {
            builder = builder.timeout(Duration::from_secs(secs) + EXECUTE_TIMEOUT_MARGIN);
        }
        self.send_json(builder).await
    }

    async fn create_session(&self, id: &str, session_id: &str) -> Result<()> {
        let url = self.toolbox_url(id, "process/session");
        let body = serde_json::json!({ "sessionId": session_id });
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str, session_id: &str) -> Result<()> {
        let url = self.toolbox_url(id, &format!("process/session/{session_id}"));
        self.send(self.http.delete(url)).await?;
        Ok(())
    }

    async fn execute_session_command(
        &self,
        id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> Result<SessionExecuteResponse> {
        tracing::debug!(
            workspace = %id,
            session_id = %session_id,
            run_async = request.run_async,
            "Submitting session command"
        );
        let url = self.toolbox_url(id, &format!("process/session/{session_id}/exec"));
        self.send_json(self.http.post(url).json(request)).await
    }

    async fn get_session_command_logs(
        &self,
        id: &str,
        session_id: &str,
        command_id: &str,
    ) -> Result<String> {
        let url = self.toolbox_url(
            id,
            &format!("process/session/{session_id}/command/{command_id}/logs"),
        );
        let resp = self.send(self.http.get(url)).await?;
        Ok(resp.text().await?)
    }

    async fn create_folder(&self, id: &str, path: &str, mode: &str) -> Result<()> {
        let url = self.toolbox_url(id, "files/folder");
        let request = self.http.post(url).query(&[("path", path), ("mode", mode)]);
        self.send(request).await?;
        Ok(())
    }

    async fn upload_file(&self, id: &str, path: &str, data: Bytes) -> Result<()> {
        tracing::debug!(workspace = %id, path = %path, size = data.len(), "Uploading file");
        let url = self.toolbox_url(id, "files/upload");
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let part = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let request = self.http.post(url).query(&[("path", path)]).multipart(form);
        self.send(request).await?;
        Ok(())
    }

    async fn download_file(&self, id: &str, path: &str) -> Result<Bytes> {
        let url = self.toolbox_url(id, "files/download");
        let resp = self.send(self.http.get(url).query(&[("path", path)])).await?;
        let data = resp.bytes().await?;
        tracing::debug!(workspace = %id, path = %path, size = data.len(), "Downloaded file");
        Ok(data)
    }

    async fn delete_file(&self, id: &str, path: &str) -> Result<()> {
        let url = self.toolbox_url(id, "files");
        self.send(self.http.delete(url).query(&[("path", path)]))
            .await?;
        Ok(())
    }

    async fn set_file_permissions(&self, id: &str, path: &str, mode: &str) -> Result<()> {
        let url = self.toolbox_url(id, "files/permissions");
        let request = self.http.post(url).query(&[("path", path), ("mode", mode)]);
        self.send(request).await?;
        Ok(())
    }

    async fn preview_url(&self, id: &str, port: u16) -> Result<String> {
        let url = format!("{}/ports/{port}/preview-url", self.workspace_url(id));
        let preview: PreviewUrl = self.send_json(self.http.get(url)).await?;
        Ok(preview.url)
    }
}
