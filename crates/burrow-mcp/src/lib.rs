//! # burrow-mcp
//!
//! MCP (Model Context Protocol) server exposing Burrow sandboxes to AI agents.
//!
//! ## Quick Start
//!
//! Local mode (docker compose + tmux), no credentials needed:
//!
//! ```bash
//! cargo run -p burrow-mcp
//! ```
//!
//! Remote mode:
//!
//! ```bash
//! export DAYTONA_API_KEY=...
//! export DAYTONA_SERVER_URL=https://app.daytona.io/api
//! cargo run -p burrow-mcp
//! ```
//!
//! ## MCP Tools
//!
//! | Tool | Description |
//! |------|-------------|
//! | `create_sandbox` | Provision a sandbox and start its supervisor |
//! | `get_or_start_sandbox` | Fetch a sandbox, resuming it if stopped or archived |
//! | `delete_sandbox` | Delete a sandbox |
//! | `execute` | Run a one-shot shell command |
//! | `create_session` / `delete_session` | Manage interactive sessions |
//! | `execute_session_command` | Submit a command into a session |
//! | `get_session_command_logs` | Read session output |
//! | `create_folder` / `upload_file` / `download_file` / `delete_file` | File transfer |
//! | `set_file_permissions` | Change a file's mode |
//! | `get_preview_link` | Public URL for a sandbox port |

pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod types;

pub use config::{McpConfig, TransportMode};
pub use error::ToolError;
pub use server::BurrowServer;
