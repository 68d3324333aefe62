//! In-memory stand-ins for the orchestration API and the container runtime.

#![allow(dead_code)]

use async_trait::async_trait;
use burrow_api::{
    ApiError, CreateWorkspaceRequest, ExecuteRequest, ExecuteResponse, OrchestrationApi,
    SessionExecuteRequest, SessionExecuteResponse, Workspace, WorkspaceState,
};
use burrow_core::{CommandOutput, CommandRunner, CoreError};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

// ---------------------------------------------------------------------------
// FakeApi
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ApiState {
    pub workspaces: HashMap<String, Workspace>,
    pub created: Vec<CreateWorkspaceRequest>,
    pub starts: Vec<String>,
    pub removed: Vec<String>,
    pub gets: usize,
    /// `(workspace, session)` pairs in creation order.
    pub sessions_created: Vec<(String, String)>,
    /// Commands submitted per `(workspace, session)`.
    pub session_commands: HashMap<(String, String), Vec<SessionExecuteRequest>>,
    pub files: HashMap<(String, String), Bytes>,
    pub folders: HashSet<(String, String)>,
    pub modes: HashMap<(String, String), String>,
    /// State a started workspace lands in. `None` means `Started`.
    pub start_result: Option<WorkspaceState>,
    /// Fail `start_workspace` with this status.
    pub start_error: Option<u16>,
    /// Delay applied to every `execute` call.
    pub exec_delay: Option<Duration>,
}

/// In-memory [`OrchestrationApi`].
#[derive(Default)]
pub struct FakeApi {
    pub state: Mutex<ApiState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(self, id: &str, state: WorkspaceState) -> Self {
        self.state
            .lock()
            .unwrap()
            .workspaces
            .insert(id.to_string(), workspace(id, state, HashMap::new()));
        self
    }

    pub fn starts(&self) -> Vec<String> {
        self.state.lock().unwrap().starts.clone()
    }

    pub fn sessions_created(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().sessions_created.clone()
    }

    pub fn session_commands(&self, id: &str, session: &str) -> Vec<SessionExecuteRequest> {
        self.state
            .lock()
            .unwrap()
            .session_commands
            .get(&(id.to_string(), session.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn require(&self, id: &str) -> burrow_api::Result<()> {
        if self.state.lock().unwrap().workspaces.contains_key(id) {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("workspace/{id}")))
        }
    }
}

fn workspace(id: &str, state: WorkspaceState, labels: HashMap<String, String>) -> Workspace {
    Workspace {
        id: id.to_string(),
        state,
        labels,
        target: Some("us".to_string()),
        image: None,
        created_at: None,
    }
}

#[async_trait]
impl OrchestrationApi for FakeApi {
    async fn get_workspace(&self, id: &str) -> burrow_api::Result<Workspace> {
        let mut state = self.state.lock().unwrap();
        state.gets += 1;
        state
            .workspaces
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("workspace/{id}")))
    }

    async fn create_workspace(&self, request: &CreateWorkspaceRequest) -> burrow_api::Result<Workspace> {
        let mut state = self.state.lock().unwrap();
        let id = format!("sb-{}", state.created.len() + 1);
        let ws = workspace(&id, WorkspaceState::Started, request.labels.clone().unwrap_or_default());
        state.workspaces.insert(id, ws.clone());
        state.created.push(request.clone());
        Ok(ws)
    }

    async fn start_workspace(&self, id: &str) -> burrow_api::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.starts.push(id.to_string());
        if let Some(status) = state.start_error {
            return Err(ApiError::Status {
                status,
                body: "start refused".into(),
            });
        }
        let next = state.start_result.unwrap_or(WorkspaceState::Started);
        match state.workspaces.get_mut(id) {
            Some(ws) => {
                ws.state = next;
                Ok(())
            }
            None => Err(ApiError::NotFound(format!("workspace/{id}"))),
        }
    }

    async fn remove_workspace(&self, id: &str) -> burrow_api::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removed.push(id.to_string());
        state
            .workspaces
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("workspace/{id}")))
    }

    async fn execute(&self, id: &str, request: &ExecuteRequest) -> burrow_api::Result<ExecuteResponse> {
        self.require(id)?;
        let delay = self.state.lock().unwrap().exec_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let result = request
            .command
            .strip_prefix("echo ")
            .map(|rest| format!("{rest}\n"))
            .unwrap_or_default();
        Ok(ExecuteResponse {
            exit_code: 0,
            result,
        })
    }

    async fn create_session(&self, id: &str, session_id: &str) -> burrow_api::Result<()> {
        self.require(id)?;
        let mut state = self.state.lock().unwrap();
        let key = (id.to_string(), session_id.to_string());
        if state.session_commands.contains_key(&key) {
            return Err(ApiError::Status {
                status: 409,
                body: "session already exists".into(),
            });
        }
        state.sessions_created.push(key.clone());
        state.session_commands.insert(key, Vec::new());
        Ok(())
    }

    async fn delete_session(&self, id: &str, session_id: &str) -> burrow_api::Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .session_commands
            .remove(&(id.to_string(), session_id.to_string()))
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("session/{session_id}")))
    }

    async fn execute_session_command(
        &self,
        id: &str,
        session_id: &str,
        request: &SessionExecuteRequest,
    ) -> burrow_api::Result<SessionExecuteResponse> {
        let mut state = self.state.lock().unwrap();
        let commands = state
            .session_commands
            .get_mut(&(id.to_string(), session_id.to_string()))
            .ok_or_else(|| ApiError::NotFound(format!("session/{session_id}")))?;
        commands.push(request.clone());
        Ok(SessionExecuteResponse {
            cmd_id: format!("cmd-{}", commands.len()),
            output: None,
            exit_code: if request.run_async { None } else { Some(0) },
        })
    }

    async fn get_session_command_logs(
        &self,
        id: &str,
        session_id: &str,
        command_id: &str,
    ) -> burrow_api::Result<String> {
        let state = self.state.lock().unwrap();
        let commands = state
            .session_commands
            .get(&(id.to_string(), session_id.to_string()))
            .ok_or_else(|| ApiError::NotFound(format!("session/{session_id}")))?;
        let index: usize = command_id
            .trim_start_matches("cmd-")
            .parse()
            .map_err(|_| ApiError::NotFound(format!("command/{command_id}")))?;
        let request = commands
            .get(index.wrapping_sub(1))
            .ok_or_else(|| ApiError::NotFound(format!("command/{command_id}")))?;
        Ok(request
            .command
            .strip_prefix("echo ")
            .map(|rest| format!("{rest}\n"))
            .unwrap_or_default())
    }

    async fn create_folder(&self, id: &str, path: &str, mode: &str) -> burrow_api::Result<()> {
        self.require(id)?;
        let mut state = self.state.lock().unwrap();
        state.folders.insert((id.to_string(), path.to_string()));
        state.modes.insert((id.to_string(), path.to_string()), mode.to_string());
        Ok(())
    }

    async fn upload_file(&self, id: &str, path: &str, data: Bytes) -> burrow_api::Result<()> {
        self.require(id)?;
        self.state
            .lock()
            .unwrap()
            .files
            .insert((id.to_string(), path.to_string()), data);
        Ok(())
    }

    async fn download_file(&self, id: &str, path: &str) -> burrow_api::Result<Bytes> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(id.to_string(), path.to_string()))
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("file {path}")))
    }

    async fn delete_file(&self, id: &str, path: &str) -> burrow_api::Result<()> {
        self.state
            .lock()
            .unwrap()
            .files
            .remove(&(id.to_string(), path.to_string()))
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound(format!("file {path}")))
    }

    async fn set_file_permissions(&self, id: &str, path: &str, mode: &str) -> burrow_api::Result<()> {
        self.require(id)?;
        self.state
            .lock()
            .unwrap()
            .modes
            .insert((id.to_string(), path.to_string()), mode.to_string());
        Ok(())
    }

    async fn preview_url(&self, id: &str, port: u16) -> burrow_api::Result<String> {
        self.require(id)?;
        Ok(format!("https://{port}-{id}.proxy.example.test"))
    }
}

// ---------------------------------------------------------------------------
// FakeDocker
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DockerState {
    /// Every invocation's argument list, in order.
    pub calls: Vec<Vec<String>>,
    pub compose_ups: usize,
    pub compose_downs: usize,
    /// Number of containers handed out so far.
    pub containers: usize,
    /// `compose up` exits non-zero.
    pub fail_up: bool,
    /// `compose down` exits non-zero.
    pub fail_down: bool,
    /// `compose ps -q` prints nothing.
    pub no_container_id: bool,
    /// Pane scroll-back per tmux session.
    pub panes: HashMap<String, String>,
    pub files: HashMap<String, Vec<u8>>,
    pub dirs: HashSet<String>,
    pub modes: HashMap<String, String>,
}

/// [`CommandRunner`] that emulates `docker compose`, `docker exec`, tmux and
/// the coreutils the local backend relies on.
#[derive(Default)]
pub struct FakeDocker {
    pub state: Mutex<DockerState>,
}

impl FakeDocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&self, f: impl FnOnce(&mut DockerState)) {
        f(&mut self.state.lock().unwrap());
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn compose_ups(&self) -> usize {
        self.state.lock().unwrap().compose_ups
    }

    pub fn compose_downs(&self) -> usize {
        self.state.lock().unwrap().compose_downs
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().unwrap().files.get(path).cloned()
    }

    pub fn mode(&self, path: &str) -> Option<String> {
        self.state.lock().unwrap().modes.get(path).cloned()
    }

    fn compose(&self, args: &[&str]) -> CommandOutput {
        let mut state = self.state.lock().unwrap();
        match args {
            ["up", "-d"] => {
                state.compose_ups += 1;
                if state.fail_up {
                    CommandOutput::failed(1, "Cannot connect to the Docker daemon")
                } else {
                    CommandOutput::ok("")
                }
            }
            ["ps", "-q", _service] => {
                if state.no_container_id {
                    return CommandOutput::ok("");
                }
                state.containers += 1;
                CommandOutput::ok(format!("container-{}\n", state.containers))
            }
            ["down"] => {
                state.compose_downs += 1;
                if state.fail_down {
                    CommandOutput::failed(1, "no such project")
                } else {
                    CommandOutput::ok("")
                }
            }
            other => CommandOutput::failed(125, format!("unknown compose args {other:?}")),
        }
    }

    async fn exec(&self, argv: &[&str], stdin: Option<Bytes>) -> CommandOutput {
        match argv {
            ["bash", "-lc", command] => self.shell(command).await,
            ["tmux", "new-session", "-d", "-s", session] => {
                let mut state = self.state.lock().unwrap();
                if state.panes.contains_key(*session) {
                    return CommandOutput::failed(1, format!("duplicate session: {session}"));
                }
                state.panes.insert(session.to_string(), String::new());
                CommandOutput::ok("")
            }
            ["tmux", "kill-session", "-t", session] => {
                let mut state = self.state.lock().unwrap();
                match state.panes.remove(*session) {
                    Some(_) => CommandOutput::ok(""),
                    None => CommandOutput::failed(1, format!("can't find session: {session}")),
                }
            }
            ["tmux", "send-keys", "-t", session, keys, "Enter"] => {
                let mut state = self.state.lock().unwrap();
                let Some(pane) = state.panes.get_mut(*session) else {
                    return CommandOutput::failed(1, format!("can't find session: {session}"));
                };
                pane.push_str(&format!("$ {keys}\n"));
                if let Some(rest) = keys.strip_prefix("echo ") {
                    pane.push_str(rest);
                    pane.push('\n');
                }
                CommandOutput::ok("")
            }
            ["tmux", "capture-pane", "-t", session, "-p", "-S", "-", "-E", "-"] => {
                let state = self.state.lock().unwrap();
                match state.panes.get(*session) {
                    Some(pane) => CommandOutput::ok(pane.clone()),
                    None => CommandOutput::failed(1, format!("can't find session: {session}")),
                }
            }
            ["mkdir", "-p", path] => {
                self.state.lock().unwrap().dirs.insert(path.to_string());
                CommandOutput::ok("")
            }
            ["chmod", mode, path] => {
                let mut state = self.state.lock().unwrap();
                if !state.dirs.contains(*path) && !state.files.contains_key(*path) {
                    return CommandOutput::failed(1, format!("chmod: cannot access '{path}'"));
                }
                state.modes.insert(path.to_string(), mode.to_string());
                CommandOutput::ok("")
            }
            ["sh", "-c", r#"cat > "$1""#, "sh", path] => {
                let data = stdin.map(|b| b.to_vec()).unwrap_or_default();
                self.state.lock().unwrap().files.insert(path.to_string(), data);
                CommandOutput::ok("")
            }
            ["cat", path] => match self.state.lock().unwrap().files.get(*path) {
                Some(data) => CommandOutput::ok(data.clone()),
                None => CommandOutput::failed(1, format!("cat: {path}: No such file or directory")),
            },
            ["rm", "-f", path] => {
                self.state.lock().unwrap().files.remove(*path);
                CommandOutput::ok("")
            }
            other => CommandOutput::failed(127, format!("unknown exec args {other:?}")),
        }
    }

    /// A very small shell: `echo`, `exit N` and `sleep N`.
    async fn shell(&self, command: &str) -> CommandOutput {
        if let Some(rest) = command.strip_prefix("echo ") {
            return CommandOutput::ok(format!("{rest}\n"));
        }
        if let Some(code) = command.strip_prefix("exit ") {
            return CommandOutput::failed(code.trim().parse().unwrap_or(1), "");
        }
        if let Some(secs) = command.strip_prefix("sleep ") {
            let secs: u64 = secs.trim().parse().unwrap_or(0);
            tokio::time::sleep(Duration::from_secs(secs)).await;
            return CommandOutput::ok("");
        }
        CommandOutput::failed(127, format!("bash: {command}: command not found"))
    }
}

#[async_trait]
impl CommandRunner for FakeDocker {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<Bytes>,
        timeout: Option<Duration>,
    ) -> burrow_core::Result<CommandOutput> {
        if program != "docker" {
            return Err(CoreError::Command {
                program: program.to_string(),
                message: "No such file or directory (os error 2)".into(),
            });
        }
        self.state.lock().unwrap().calls.push(args.to_vec());

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let work = async {
            match args.as_slice() {
                ["compose", "-f", _file, rest @ ..] => self.compose(rest),
                ["exec", "-i", _container, argv @ ..] => self.exec(argv, stdin).await,
                ["exec", _container, argv @ ..] => self.exec(argv, stdin).await,
                other => CommandOutput::failed(125, format!("unknown docker args {other:?}")),
            }
        };

        match timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| CoreError::Timeout(limit)),
            None => Ok(work.await),
        }
    }
}
