//! # burrow-api
//!
//! Typed client for the remote sandbox orchestration API.
//!
//! The orchestration service is treated as a black box: it provisions
//! workspaces, reports their lifecycle state, and exposes a per-workspace
//! toolbox for process and filesystem operations. This crate only models the
//! subset of the surface that Burrow needs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use burrow_api::{ApiConfig, HttpOrchestrationClient, OrchestrationApi};
//!
//! # async fn example() -> burrow_api::Result<()> {
//! let client = HttpOrchestrationClient::new(ApiConfig::new(
//!     "my-api-key",
//!     "https://app.daytona.io/api",
//! ))?;
//!
//! let workspace = client.get_workspace("sb-1").await?;
//! if workspace.state.is_stopped_or_archived() {
//!     client.start_workspace(&workspace.id).await?;
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::{ApiConfig, HttpOrchestrationClient, OrchestrationApi};
pub use error::{ApiError, Result};
pub use models::{
    CreateWorkspaceRequest, ExecuteRequest, ExecuteResponse, PreviewUrl, SessionExecuteRequest,
    SessionExecuteResponse, Workspace, WorkspaceState,
};
