//! External process execution.
//!
//! Everything the local backend does goes through [`CommandRunner`], so the
//! container runtime can be swapped for an in-memory fake in tests.

use crate::error::{CoreError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of an external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, or `None` if the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status: Some(code),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == Some(0)
    }

    /// Exit code, -1 if the process did not exit normally.
    pub fn code(&self) -> i32 {
        self.status.unwrap_or(-1)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs an external program to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with a literal argument list.
    ///
    /// `stdin`, when given, is streamed to the process and then closed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Command`] if the process cannot be spawned and
    /// [`CoreError::Timeout`] if `timeout` elapses first. A non-zero exit is
    /// not an error; inspect [`CommandOutput::status`].
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        tracing::trace!(program, ?args, "Spawning process");

        let mut child = Command::new(program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::Command {
                program: program.to_string(),
                message: e.to_string(),
            })?;

        let input = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(data)) = (input, stdin) {
                pipe.write_all(&data).await?;
                pipe.shutdown().await?;
            }
            Ok::<(), std::io::Error>(())
        };

        let run = async {
            let (fed, output) = tokio::join!(feed, child.wait_with_output());
            if let Err(e) = fed {
                // The process may exit before draining stdin; its status
                // tells the real story.
                tracing::debug!(program, error = %e, "Failed to write process stdin");
            }
            output
        };

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| CoreError::Timeout(limit))?,
            None => run.await,
        }
        .map_err(|e| CoreError::Command {
            program: program.to_string(),
            message: e.to_string(),
        })?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
