//! # burrow-core
//!
//! Backend-agnostic sandbox layer for Burrow.
//!
//! A sandbox is an isolated environment that runs shell commands, hosts
//! long-lived interactive sessions and stores files. It lives either behind a
//! remote orchestration API or in a single local container managed through
//! the container runtime CLI. Callers see the same [`Sandbox`] handle either
//! way.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     Orchestrator                          │
//! │   get_or_start()   create()   delete()   supervisor       │
//! └──────────────┬───────────────────────────┬────────────────┘
//!                │ Backend::Remote           │ Backend::Local
//!                ▼                           ▼
//! ┌──────────────────────────┐  ┌────────────────────────────┐
//! │ RemoteBackend            │  │ LocalBackend               │
//! │  OrchestrationApi (HTTP) │  │  Mutex<Option<Sandbox>>    │
//! │  toolbox process / fs    │  │  docker compose / exec     │
//! └──────────────┬───────────┘  │  tmux sessions             │
//!                │              └─────────────┬──────────────┘
//!                └──────────────┬─────────────┘
//!                               ▼
//!              ┌─────────────────────────────────┐
//!              │ Sandbox                         │
//!              │  process(): &dyn Process        │
//!              │  fs():      &dyn FileSystem     │
//!              │  get_preview_link(port)         │
//!              └─────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use burrow_core::{CreateParams, Orchestrator, Permissions, SandboxSettings};
//! use bytes::Bytes;
//!
//! # async fn example() -> burrow_core::Result<()> {
//! let orchestrator = Orchestrator::from_config(&SandboxSettings::from_env())?;
//!
//! let params = CreateParams::new(burrow_core::generate_password()).with_project("proj-1");
//! let sandbox = orchestrator.create(&params).await?;
//!
//! sandbox.fs().create_folder("/workspace/app", &Permissions::default()).await?;
//! sandbox
//!     .fs()
//!     .upload_file("/workspace/app/main.py", Bytes::from_static(b"print('hi')"))
//!     .await?;
//!
//! sandbox.process().create_session("dev").await?;
//! sandbox
//!     .process()
//!     .execute_session_command("dev", "python3 /workspace/app/main.py", true)
//!     .await?;
//!
//! println!("{}", sandbox.get_preview_link(8080).await?);
//! orchestrator.delete(sandbox.id()).await?;
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
mod error;
mod local;
mod ops;
mod orchestrator;
mod remote;
mod sandbox;

pub use backend::Backend;
pub use config::{
    generate_password, sandbox_env, CreateParams, LocalSettings, Resources, SandboxSettings,
    DEFAULT_EXEC_TIMEOUT, DEFAULT_IMAGE, DEFAULT_SERVER_URL, DEFAULT_TARGET, SUPERVISOR_COMMAND,
    SUPERVISOR_SESSION,
};
pub use error::{CoreError, Result};
pub use local::runner::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use local::{LocalBackend, LOCAL_SANDBOX_ID};
pub use ops::{FileSystem, PortPreview, Process};
pub use orchestrator::{Orchestrator, DEFAULT_START_POLL_INTERVAL, DEFAULT_START_TIMEOUT};
pub use remote::RemoteBackend;
pub use sandbox::{ExecResult, Permissions, Sandbox, SandboxId, SandboxState, SessionCommand};

/// Milliseconds in `elapsed`, saturating for log fields.
pub(crate) fn elapsed_ms(elapsed: std::time::Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
