//! Local backend - a single compose-managed container driven through the
//! container runtime CLI.
//!
//! The backend tracks at most one sandbox. [`LocalBackend::ensure`] starts the
//! compose project on first use and memoizes the handle;
//! [`LocalBackend::teardown`] stops the project and forgets it. Both take the
//! same lock, so concurrent lifecycle calls are serialized.

mod docker;
mod fs;
mod process;
pub mod runner;

use crate::config::LocalSettings;
use crate::error::Result;
use crate::ops::PortPreview;
use crate::sandbox::{Sandbox, SandboxId, SandboxState};
use async_trait::async_trait;
use docker::DockerCli;
use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Identifier used when the compose service container cannot be resolved.
pub const LOCAL_SANDBOX_ID: &str = "local-sandbox";

/// Single-instance sandbox backed by a local container.
pub struct LocalBackend {
    docker: DockerCli,
    settings: LocalSettings,
    current: Mutex<Option<Sandbox>>,
}

impl LocalBackend {
    /// Create a backend that shells out to the real container runtime.
    pub fn new(settings: LocalSettings) -> Self {
        Self::with_runner(settings, Arc::new(TokioCommandRunner))
    }

    /// Create a backend on top of a custom [`CommandRunner`].
    pub fn with_runner(settings: LocalSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            docker: DockerCli::new(runner, settings.docker_bin.clone()),
            settings,
            current: Mutex::new(None),
        }
    }

    /// Return the tracked sandbox, starting the compose project if there is
    /// none.
    ///
    /// # Errors
    ///
    /// Fails if the runtime cannot be invoked or `compose up` exits non-zero.
    /// Failing to resolve the container ID is not an error; the sandbox then
    /// uses [`LOCAL_SANDBOX_ID`].
    pub async fn ensure(&self) -> Result<Sandbox> {
        let mut current = self.current.lock().await;
        if let Some(sandbox) = current.as_ref() {
            tracing::debug!(sandbox_id = %sandbox.id(), "Reusing local sandbox");
            return Ok(sandbox.clone());
        }

        let compose_file = &self.settings.compose_file;
        tracing::info!(compose_file = %compose_file.display(), "Starting local sandbox");
        self.docker.compose_up(compose_file).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to start local sandbox");
        })?;

        let container = match self
            .docker
            .compose_container_id(compose_file, &self.settings.service)
            .await?
        {
            Some(id) => id,
            None => {
                tracing::warn!(
                    service = %self.settings.service,
                    fallback = LOCAL_SANDBOX_ID,
                    "No container ID for compose service"
                );
                LOCAL_SANDBOX_ID.to_string()
            }
        };

        let sandbox = Sandbox::new(
            SandboxId::new(container.clone()),
            SandboxState::Running,
            Arc::new(process::LocalProcess::new(self.docker.clone(), container.clone())),
            Arc::new(fs::LocalFs::new(self.docker.clone(), container)),
            Arc::new(LocalPreview),
        )
        .with_created_at(Some(chrono::Utc::now()));

        tracing::info!(sandbox_id = %sandbox.id(), "Local sandbox ready");
        *current = Some(sandbox.clone());
        Ok(sandbox)
    }

    /// Stop the compose project and forget the tracked sandbox.
    ///
    /// Never fails: teardown errors are logged and the memo is cleared
    /// regardless, so the next [`ensure`](Self::ensure) provisions afresh.
    pub async fn teardown(&self) {
        let mut current = self.current.lock().await;
        let compose_file = &self.settings.compose_file;
        tracing::info!(compose_file = %compose_file.display(), "Stopping local sandbox");

        match self.docker.compose_down(compose_file).await {
            Ok(output) if output.success() => {
                tracing::info!("Local sandbox stopped");
            }
            Ok(output) => {
                tracing::warn!(
                    code = output.code(),
                    stderr = %output.stderr_lossy().trim(),
                    "compose down failed, clearing local sandbox anyway"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "compose down could not run, clearing local sandbox anyway");
            }
        }

        *current = None;
    }

    /// The tracked sandbox, if one is running.
    pub async fn current(&self) -> Option<Sandbox> {
        self.current.lock().await.clone()
    }

    pub fn settings(&self) -> &LocalSettings {
        &self.settings
    }
}

impl std::fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Loopback URLs; compose publishes sandbox ports on the host.
struct LocalPreview;

#[async_trait]
impl PortPreview for LocalPreview {
    async fn preview_link(&self, port: u16) -> Result<String> {
        Ok(local_preview_url(port))
    }
}

fn local_preview_url(port: u16) -> String {
    format!("http://localhost:{port}")
}

/// Log a non-zero exit from a best-effort call and hand the output back.
fn log_if_failed(op: &str, container: &str, output: CommandOutput) -> CommandOutput {
    if !output.success() {
        tracing::warn!(
            container,
            op,
            code = output.code(),
            stderr = %output.stderr_lossy().trim(),
            "Local sandbox call failed, ignoring"
        );
    }
    output
}
