//! Lifecycle orchestration across backends.
//!
//! The [`Orchestrator`] is the entry point callers use to obtain sandbox
//! handles. It owns the selected [`Backend`] and drives it through the
//! get-or-start, create and delete flows, bootstrapping the process
//! supervisor on remote sandboxes.

use crate::backend::Backend;
use crate::config::{CreateParams, SandboxSettings, SUPERVISOR_COMMAND, SUPERVISOR_SESSION};
use crate::error::{CoreError, Result};
use crate::remote::RemoteBackend;
use crate::sandbox::{Sandbox, SandboxId, SandboxState};
use std::time::Duration;
use tokio::time::Instant;

/// How long to wait for a started remote sandbox to report `running`.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between state re-fetches while a remote sandbox is starting.
pub const DEFAULT_START_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Coordinates sandbox lifecycle on the active backend.
///
/// # Example
///
/// ```no_run
/// use burrow_core::{Orchestrator, SandboxId, SandboxSettings};
///
/// # async fn example() -> burrow_core::Result<()> {
/// let orchestrator = Orchestrator::from_config(&SandboxSettings::from_env())?;
/// let sandbox = orchestrator.get_or_start(&SandboxId::new("sb-1")).await?;
/// let result = sandbox
///     .process()
///     .execute("uname -a", burrow_core::DEFAULT_EXEC_TIMEOUT)
///     .await?;
/// println!("{}", result.output);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Orchestrator {
    backend: Backend,
    start_timeout: Duration,
    poll_interval: Duration,
}

impl Orchestrator {
    /// Wrap an already-selected backend.
    pub fn new(backend: impl Into<Backend>) -> Self {
        Self {
            backend: backend.into(),
            start_timeout: DEFAULT_START_TIMEOUT,
            poll_interval: DEFAULT_START_POLL_INTERVAL,
        }
    }

    /// Select the backend from settings and wrap it.
    pub fn from_config(settings: &SandboxSettings) -> Result<Self> {
        let backend = Backend::select(settings)?;
        tracing::info!(backend = backend.kind(), "Sandbox orchestrator initialized");
        Ok(Self::new(backend))
    }

    /// Override how long get-or-start waits for a remote sandbox to come up.
    pub fn with_start_timeout(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.start_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Return a usable handle for `id`, starting it first if needed.
    ///
    /// On the local backend `id` is ignored and the single local sandbox is
    /// returned, provisioning it if necessary. On the remote backend a
    /// stopped or archived sandbox is started, re-fetched and given a fresh
    /// supervisor session; a running one is returned untouched.
    #[tracing::instrument(level = "debug", skip(self), fields(sandbox_id = %id, backend = self.backend.kind()))]
    pub async fn get_or_start(&self, id: &SandboxId) -> Result<Sandbox> {
        let remote = match &self.backend {
            Backend::Local(local) => return local.ensure().await,
            Backend::Remote(remote) => remote,
        };

        let sandbox = remote.get(id).await?;
        if !sandbox.state().needs_start() {
            tracing::debug!(sandbox_id = %id, state = %sandbox.state(), "Sandbox already usable");
            return Ok(sandbox);
        }

        tracing::info!(sandbox_id = %id, state = %sandbox.state(), "Starting sandbox");
        remote.start(&sandbox).await?;
        let sandbox = self.wait_until_running(remote, id).await?;
        self.start_supervisor_session(&sandbox).await?;
        Ok(sandbox)
    }

    /// Provision a new sandbox.
    ///
    /// On the local backend this is the same as ensuring the local sandbox.
    /// On the remote backend the supervisor session is started before the
    /// handle is returned.
    #[tracing::instrument(level = "info", skip(self, params), fields(backend = self.backend.kind()))]
    pub async fn create(&self, params: &CreateParams) -> Result<Sandbox> {
        match &self.backend {
            Backend::Local(local) => local.ensure().await,
            Backend::Remote(remote) => {
                let sandbox = remote.create(params).await?;
                self.start_supervisor_session(&sandbox).await?;
                Ok(sandbox)
            }
        }
    }

    /// Launch the process supervisor in its own session.
    ///
    /// No-op on the local backend, whose container entry point already runs
    /// the supervisor.
    pub async fn start_supervisor_session(&self, sandbox: &Sandbox) -> Result<()> {
        if self.backend.is_local() {
            tracing::debug!(sandbox_id = %sandbox.id(), "Local sandbox runs its own supervisor");
            return Ok(());
        }

        let process = sandbox.process();
        process
            .create_session(SUPERVISOR_SESSION)
            .await
            .inspect_err(|e| {
                tracing::error!(sandbox_id = %sandbox.id(), error = %e, "Failed to create supervisor session");
            })?;
        process
            .execute_session_command(SUPERVISOR_SESSION, SUPERVISOR_COMMAND, true)
            .await
            .inspect_err(|e| {
                tracing::error!(sandbox_id = %sandbox.id(), error = %e, "Failed to launch supervisor");
            })?;

        tracing::info!(sandbox_id = %sandbox.id(), session_id = SUPERVISOR_SESSION, "Supervisor started");
        Ok(())
    }

    /// Delete a sandbox.
    ///
    /// On the local backend `id` is ignored; teardown always reports
    /// success and clears the tracked sandbox.
    #[tracing::instrument(level = "info", skip(self), fields(sandbox_id = %id, backend = self.backend.kind()))]
    pub async fn delete(&self, id: &SandboxId) -> Result<bool> {
        match &self.backend {
            Backend::Local(local) => {
                local.teardown().await;
                Ok(true)
            }
            Backend::Remote(remote) => {
                let sandbox = remote.get(id).await?;
                remote.remove(&sandbox).await?;
                tracing::info!(sandbox_id = %id, "Sandbox deleted");
                Ok(true)
            }
        }
    }

    /// Re-fetch a just-started sandbox until it reports `running`.
    ///
    /// Only the API's transitional states are waited out. Anything else,
    /// such as `stopped` or `error`, fails at once with the raw state.
    async fn wait_until_running(&self, remote: &RemoteBackend, id: &SandboxId) -> Result<Sandbox> {
        let started = Instant::now();
        loop {
            let sandbox = remote.get(id).await?;
            if sandbox.state() == SandboxState::Running {
                tracing::info!(
                    sandbox_id = %id,
                    elapsed_ms = crate::elapsed_ms(started.elapsed()),
                    "Sandbox running"
                );
                return Ok(sandbox);
            }

            let transitional = sandbox
                .remote_state()
                .map_or(sandbox.state() == SandboxState::Unknown, |s| s.is_transitional());
            if transitional && started.elapsed() < self.start_timeout {
                tracing::debug!(sandbox_id = %id, state = ?sandbox.remote_state(), "Sandbox still transitioning");
                tokio::time::sleep(self.poll_interval).await;
                continue;
            }

            let actual = sandbox
                .remote_state()
                .map_or_else(|| sandbox.state().to_string(), |s| s.to_string());
            tracing::error!(sandbox_id = %id, state = %actual, "Sandbox did not reach running after start");
            return Err(CoreError::InvalidState {
                expected: SandboxState::Running.to_string(),
                actual,
            });
        }
    }
}
