//! Backend selection.
//!
//! The choice between remote and local is made once from settings and never
//! revisited; the resulting [`Backend`] is owned by the
//! [`Orchestrator`](crate::Orchestrator).

use crate::config::SandboxSettings;
use crate::error::Result;
use crate::local::LocalBackend;
use crate::remote::RemoteBackend;

/// The active sandbox backend.
pub enum Backend {
    /// Sandboxes provisioned through the orchestration API.
    Remote(RemoteBackend),
    /// One compose-managed container on this host.
    Local(LocalBackend),
}

impl Backend {
    /// Pick a backend from settings.
    ///
    /// A non-blank API key selects [`Backend::Remote`]; anything else falls
    /// back to [`Backend::Local`] with a warning. Incomplete remote settings
    /// are only warned about.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client for the remote backend cannot be built.
    /// A missing server URL falls back to the default.
    pub fn select(settings: &SandboxSettings) -> Result<Self> {
        tracing::info!(
            server_url = settings.server_url.as_deref().unwrap_or("<unset>"),
            target = settings.target.as_deref().unwrap_or("<unset>"),
            api_key_present = settings.has_credential(),
            "Resolved sandbox configuration"
        );
        settings.validate_warn();

        if settings.has_credential() {
            Ok(Self::Remote(RemoteBackend::from_settings(settings)?))
        } else {
            Ok(Self::Local(LocalBackend::new(settings.local.clone())))
        }
    }

    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote(_) => "remote",
            Self::Local(_) => "local",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote(_) => f.write_str("Backend::Remote"),
            Self::Local(local) => f.debug_tuple("Backend::Local").field(local).finish(),
        }
    }
}

impl From<RemoteBackend> for Backend {
    fn from(backend: RemoteBackend) -> Self {
        Self::Remote(backend)
    }
}

impl From<LocalBackend> for Backend {
    fn from(backend: LocalBackend) -> Self {
        Self::Local(backend)
    }
}
