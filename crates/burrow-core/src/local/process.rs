//! Process and session operations over `docker exec`.
//!
//! Sessions are tmux sessions inside the container. Session operations are
//! best-effort: a non-zero exit from tmux is logged and swallowed so that a
//! failed session call never aborts a larger workflow.

use super::docker::DockerCli;
use super::log_if_failed;
use crate::error::Result;
use crate::ops::Process;
use crate::sandbox::{ExecResult, SessionCommand};
use async_trait::async_trait;
use std::time::Duration;

pub(crate) struct LocalProcess {
    docker: DockerCli,
    container: String,
}

impl LocalProcess {
    pub(crate) fn new(docker: DockerCli, container: impl Into<String>) -> Self {
        Self {
            docker,
            container: container.into(),
        }
    }

    async fn tmux(&self, op: &str, argv: &[&str]) -> Result<String> {
        let output = self.docker.exec(&self.container, argv, None, None).await?;
        Ok(log_if_failed(op, &self.container, output).stdout_lossy())
    }
}

#[async_trait]
impl Process for LocalProcess {
    async fn execute(&self, command: &str, timeout: Duration) -> Result<ExecResult> {
        tracing::debug!(container = %self.container, command, "Executing command");
        let start = std::time::Instant::now();

        let output = self
            .docker
            .exec(
                &self.container,
                &["bash", "-lc", command],
                None,
                Some(timeout),
            )
            .await
            .inspect_err(|e| {
                tracing::error!(container = %self.container, error = %e, "Command execution failed");
            })?;

        let mut combined = output.stdout_lossy();
        combined.push_str(&output.stderr_lossy());

        tracing::debug!(
            container = %self.container,
            exit_code = output.code(),
            elapsed_ms = crate::elapsed_ms(start.elapsed()),
            "Command completed"
        );

        Ok(ExecResult {
            exit_code: output.code(),
            output: combined,
        })
    }

    async fn create_session(&self, session_id: &str) -> Result<()> {
        tracing::debug!(container = %self.container, session_id, "Creating tmux session");
        self.tmux("create_session", &["tmux", "new-session", "-d", "-s", session_id])
            .await
            .map(|_| ())
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        tracing::debug!(container = %self.container, session_id, "Killing tmux session");
        self.tmux("delete_session", &["tmux", "kill-session", "-t", session_id])
            .await
            .map(|_| ())
    }

    async fn execute_session_command(
        &self,
        session_id: &str,
        command: &str,
        run_async: bool,
    ) -> Result<SessionCommand> {
        tracing::debug!(container = %self.container, session_id, run_async, "Sending keys to session");
        // tmux gives no completion signal, so sync and async submissions
        // behave the same.
        self.tmux(
            "execute_session_command",
            &["tmux", "send-keys", "-t", session_id, command, "Enter"],
        )
        .await?;

        Ok(SessionCommand {
            cmd_id: uuid::Uuid::new_v4().to_string(),
            exit_code: Some(0),
        })
    }

    async fn get_session_command_logs(
        &self,
        session_id: &str,
        _command_id: &str,
    ) -> Result<String> {
        // Whole scroll-back; per-command output cannot be isolated in a pane.
        self.tmux(
            "get_session_command_logs",
            &["tmux", "capture-pane", "-t", session_id, "-p", "-S", "-", "-E", "-"],
        )
        .await
    }
}
