//! Sandbox settings and the parameters injected into new sandboxes.
//!
//! Settings are loaded from environment variables with sensible defaults.
//! Missing or blank values never fail; they are reported as warnings and the
//! process falls back to the local backend.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default orchestration API URL.
pub const DEFAULT_SERVER_URL: &str = "https://app.daytona.io/api";

/// Default placement target for remote sandboxes.
pub const DEFAULT_TARGET: &str = "us";

/// Default image for new remote sandboxes.
pub const DEFAULT_IMAGE: &str = "kortix/suna:0.1";

/// Session name the process supervisor runs in.
pub const SUPERVISOR_SESSION: &str = "supervisord-session";

/// Command that launches the process supervisor in the foreground.
pub const SUPERVISOR_COMMAND: &str =
    "exec /usr/bin/supervisord -n -c /etc/supervisor/conf.d/supervisord.conf";

/// Default timeout for one-shot commands.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(60);

/// Process-wide sandbox settings.
#[derive(Clone)]
pub struct SandboxSettings {
    /// Remote credential; `None` (or blank) selects the local backend.
    pub api_key: Option<String>,
    /// Orchestration API base URL, if explicitly configured.
    pub server_url: Option<String>,
    /// Region or runner pool for new remote sandboxes, if explicitly configured.
    pub target: Option<String>,
    /// Image for new remote sandboxes.
    pub image: String,
    /// Resource request for new remote sandboxes.
    pub resources: Resources,
    /// Local backend settings.
    pub local: LocalSettings,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            server_url: None,
            target: None,
            image: DEFAULT_IMAGE.to_string(),
            resources: Resources::default(),
            local: LocalSettings::default(),
        }
    }
}

impl std::fmt::Debug for SandboxSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxSettings")
            .field("api_key_present", &self.has_credential())
            .field("server_url", &self.server_url)
            .field("target", &self.target)
            .field("image", &self.image)
            .field("resources", &self.resources)
            .field("local", &self.local)
            .finish()
    }
}

impl SandboxSettings {
    /// Load settings from environment variables.
    ///
    /// Unset URL and target stay `None` here; the remote backend applies the
    /// defaults below and [`validate_warn`](Self::validate_warn) reports them.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `DAYTONA_API_KEY` | unset (local mode) |
    /// | `DAYTONA_SERVER_URL` | `https://app.daytona.io/api` |
    /// | `DAYTONA_TARGET` | `us` |
    /// | `SANDBOX_IMAGE_NAME` | `kortix/suna:0.1` |
    /// | `BURROW_COMPOSE_FILE` | `docker/docker-compose.yml` |
    /// | `BURROW_COMPOSE_SERVICE` | `kortix-suna` |
    /// | `BURROW_DOCKER_BIN` | `docker` |
    pub fn from_env() -> Self {
        let default = Self::default();
        let local_default = LocalSettings::default();

        Self {
            api_key: non_blank_env("DAYTONA_API_KEY"),
            server_url: non_blank_env("DAYTONA_SERVER_URL"),
            target: non_blank_env("DAYTONA_TARGET"),
            image: non_blank_env("SANDBOX_IMAGE_NAME").unwrap_or(default.image),
            resources: default.resources,
            local: LocalSettings {
                compose_file: non_blank_env("BURROW_COMPOSE_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(local_default.compose_file),
                service: non_blank_env("BURROW_COMPOSE_SERVICE")
                    .unwrap_or(local_default.service),
                docker_bin: non_blank_env("BURROW_DOCKER_BIN")
                    .unwrap_or(local_default.docker_bin),
            },
        }
    }

    /// Whether a non-blank remote credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    /// Base URL the remote backend will use.
    pub fn resolved_server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }

    /// Placement target the remote backend will use.
    pub fn resolved_target(&self) -> &str {
        self.target.as_deref().unwrap_or(DEFAULT_TARGET)
    }

    /// Log degraded-confidence warnings for incomplete remote settings.
    ///
    /// Never fails; incomplete settings only lower confidence that remote
    /// calls will succeed.
    pub fn validate_warn(&self) {
        if !self.has_credential() {
            tracing::warn!("No remote API key configured, using local docker-compose sandbox");
            return;
        }
        tracing::debug!("Remote API key configured");

        match &self.server_url {
            Some(url) => tracing::debug!(server_url = %url, "Remote server URL set"),
            None => tracing::warn!(
                default = DEFAULT_SERVER_URL,
                "No remote server URL configured, using default"
            ),
        }
        match &self.target {
            Some(target) => tracing::debug!(target = %target, "Remote target set"),
            None => tracing::warn!(
                default = DEFAULT_TARGET,
                "No remote target configured, using default"
            ),
        }
    }
}

/// Settings for the local container backend.
#[derive(Debug, Clone)]
pub struct LocalSettings {
    /// Compose definition started by `ensure()`.
    pub compose_file: PathBuf,
    /// Compose service whose container hosts the sandbox.
    pub service: String,
    /// Container runtime executable.
    pub docker_bin: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            compose_file: PathBuf::from("docker/docker-compose.yml"),
            service: "kortix-suna".to_string(),
            docker_bin: "docker".to_string(),
        }
    }
}

/// Resource request for a new remote sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resources {
    /// CPU cores.
    pub cpu: u32,
    /// Memory in GB.
    pub memory: u32,
    /// Disk in GB.
    pub disk: u32,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            cpu: 2,
            memory: 4,
            disk: 5,
        }
    }
}

/// Parameters for creating a sandbox.
#[derive(Clone, Default)]
pub struct CreateParams {
    /// Display-access (VNC) password injected into the sandbox.
    pub password: String,
    /// Project the sandbox belongs to; becomes the `id` label.
    pub project_id: Option<String>,
}

impl CreateParams {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            project_id: None,
        }
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Labels to attach, keyed by project identifier when one is given.
    pub fn labels(&self) -> Option<HashMap<String, String>> {
        self.project_id
            .as_ref()
            .filter(|id| !id.is_empty())
            .map(|id| HashMap::from([("id".to_string(), id.clone())]))
    }
}

impl std::fmt::Debug for CreateParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreateParams")
            .field("password", &"<redacted>")
            .field("project_id", &self.project_id)
            .finish()
    }
}

/// Environment injected into every new sandbox.
///
/// The key set is fixed; only the display password varies per sandbox.
pub fn sandbox_env(password: &str) -> HashMap<String, String> {
    [
        ("CHROME_PERSISTENT_SESSION", "true"),
        ("RESOLUTION", "1024x768x24"),
        ("RESOLUTION_WIDTH", "1024"),
        ("RESOLUTION_HEIGHT", "768"),
        ("VNC_PASSWORD", password),
        ("ANONYMIZED_TELEMETRY", "false"),
        ("CHROME_PATH", ""),
        ("CHROME_USER_DATA", ""),
        ("CHROME_DEBUGGING_PORT", "9222"),
        ("CHROME_DEBUGGING_HOST", "localhost"),
        ("CHROME_CDP", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Generate a random display-access password.
pub fn generate_password() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
