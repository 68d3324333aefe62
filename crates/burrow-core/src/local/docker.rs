//! Thin wrapper around the container runtime CLI.

use super::runner::{CommandOutput, CommandRunner};
use crate::error::{CoreError, Result};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Builds argument lists for the container runtime and hands them to a
/// [`CommandRunner`].
#[derive(Clone)]
pub(crate) struct DockerCli {
    runner: Arc<dyn CommandRunner>,
    bin: String,
}

impl DockerCli {
    pub(crate) fn new(runner: Arc<dyn CommandRunner>, bin: impl Into<String>) -> Self {
        Self {
            runner,
            bin: bin.into(),
        }
    }

    /// `docker compose -f <file> up -d`. A non-zero exit is an error.
    pub(crate) async fn compose_up(&self, file: &Path) -> Result<()> {
        let args = compose_args(file, &["up", "-d"]);
        let output = self.run(&args, None, None).await?;
        self.check(&args, output).map(|_| ())
    }

    /// `docker compose -f <file> down`. Returns the raw output; callers
    /// decide whether failure matters.
    pub(crate) async fn compose_down(&self, file: &Path) -> Result<CommandOutput> {
        self.run(&compose_args(file, &["down"]), None, None).await
    }

    /// Container ID of a compose service, if it has one.
    pub(crate) async fn compose_container_id(&self, file: &Path, service: &str) -> Result<Option<String>> {
        let args = compose_args(file, &["ps", "-q", service]);
        let output = self.run(&args, None, None).await?;
        if !output.success() {
            tracing::warn!(
                service,
                code = output.code(),
                stderr = %output.stderr_lossy().trim(),
                "Failed to resolve compose container"
            );
            return Ok(None);
        }
        Ok(output
            .stdout_lossy()
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string))
    }

    /// `docker exec [-i] <container> <argv...>`.
    pub(crate) async fn exec(
        &self,
        container: &str,
        argv: &[&str],
        stdin: Option<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        let mut args = vec!["exec".to_string()];
        if stdin.is_some() {
            args.push("-i".to_string());
        }
        args.push(container.to_string());
        args.extend(argv.iter().map(|a| a.to_string()));
        self.run(&args, stdin, timeout).await
    }

    /// Render a command line for log messages and errors.
    pub(crate) fn render(&self, args: &[String]) -> String {
        std::iter::once(self.bin.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(
        &self,
        args: &[String],
        stdin: Option<Bytes>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput> {
        self.runner.run(&self.bin, args, stdin, timeout).await
    }

    fn check(&self, args: &[String], output: CommandOutput) -> Result<CommandOutput> {
        if output.success() {
            return Ok(output);
        }
        Err(CoreError::CommandFailed {
            command: self.render(args),
            code: output.code(),
            stderr: output.stderr_lossy().trim().to_string(),
        })
    }
}

fn compose_args(file: &Path, rest: &[&str]) -> Vec<String> {
    let mut args = vec![
        "compose".to_string(),
        "-f".to_string(),
        file.display().to_string(),
    ];
    args.extend(rest.iter().map(|a| a.to_string()));
    args
}
