//! Configuration for the MCP server.
//!
//! Configuration is loaded from environment variables with sensible defaults.

use burrow_core::SandboxSettings;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Maximum size for uploaded file content in bytes (10 MB).
pub const MAX_INPUT_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum command length in characters.
pub const MAX_COMMAND_LENGTH: usize = 1024 * 1024; // 1 MB

/// Upper bound for a caller-supplied one-shot command timeout.
pub const MAX_EXEC_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Stdio only (for local AI tools)
    Stdio,
    /// Streamable HTTP only (for remote AI agents)
    Http,
    /// Both stdio and HTTP
    #[default]
    Both,
}

impl TransportMode {
    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "stdio" => Self::Stdio,
            "http" | "sse" | "remote" => Self::Http,
            _ => Self::Both,
        }
    }

    pub fn stdio_enabled(&self) -> bool {
        matches!(self, Self::Stdio | Self::Both)
    }

    pub fn http_enabled(&self) -> bool {
        matches!(self, Self::Http | Self::Both)
    }
}

/// Configuration for the Burrow MCP server.
#[derive(Debug, Clone)]
pub struct McpConfig {
    /// Backend selection and sandbox defaults.
    pub sandbox: SandboxSettings,

    /// Transport mode (default: both stdio and HTTP).
    pub transport_mode: TransportMode,

    /// HTTP server bind address.
    pub http_addr: SocketAddr,

    /// Tear the local sandbox down when the server exits (default: true).
    /// Remote sandboxes are never touched on exit.
    pub teardown_on_exit: bool,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            sandbox: SandboxSettings::default(),
            transport_mode: TransportMode::Both,
            http_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080),
            teardown_on_exit: true,
        }
    }
}

impl McpConfig {
    /// Load configuration from environment variables.
    ///
    /// Sandbox settings come from [`SandboxSettings::from_env`]. On top of
    /// those:
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `BURROW_TRANSPORT` | `both` (stdio, http, both) |
    /// | `BURROW_HTTP_HOST` | `127.0.0.1` |
    /// | `BURROW_HTTP_PORT` | `8080` |
    /// | `BURROW_TEARDOWN_ON_EXIT` | `true` |
    pub fn from_env() -> Self {
        let default = Self::default();

        let http_host: IpAddr = std::env::var("BURROW_HTTP_HOST")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default.http_addr.ip());

        let http_port: u16 = std::env::var("BURROW_HTTP_PORT")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default.http_addr.port());

        Self {
            sandbox: SandboxSettings::from_env(),
            transport_mode: std::env::var("BURROW_TRANSPORT")
                .map(|v| TransportMode::parse(&v))
                .unwrap_or(default.transport_mode),
            http_addr: SocketAddr::new(http_host, http_port),
            teardown_on_exit: std::env::var("BURROW_TEARDOWN_ON_EXIT")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(default.teardown_on_exit),
        }
    }

    /// Log warnings for risky but legal settings.
    pub fn validate_warn(&self) {
        if self.transport_mode.http_enabled() && self.http_addr.ip().is_unspecified() {
            tracing::warn!(
                addr = %self.http_addr,
                "HTTP transport listens on all interfaces and has no authentication"
            );
        }
    }
}
