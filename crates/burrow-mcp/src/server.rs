//! BurrowServer - MCP server that exposes sandbox operations as tools.
//!
//! ServerHandler is implemented by hand. Every tool that takes a
//! `sandbox_id` resolves it through [`Orchestrator::get_or_start`], so remote
//! sandboxes are fetched (and resumed if needed) on each call.

use crate::config::{McpConfig, MAX_COMMAND_LENGTH, MAX_EXEC_TIMEOUT, MAX_INPUT_SIZE_BYTES};
use crate::error::ToolError;
use crate::types::*;

use burrow_core::{
    generate_password, CreateParams, Orchestrator, Permissions, Sandbox, SandboxId,
    DEFAULT_EXEC_TIMEOUT,
};
use base64::{engine::general_purpose, Engine as _};
use bytes::Bytes;
use rmcp::{
    handler::server::ServerHandler,
    model::*,
    service::{RequestContext, RoleServer},
    ErrorData,
};
use schemars::schema_for;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

type JsonObject = serde_json::Map<String, serde_json::Value>;
type ToolResult = Result<CallToolResult, ToolError>;

/// MCP server for Burrow sandbox operations.
#[derive(Clone)]
pub struct BurrowServer {
    orchestrator: Arc<Orchestrator>,
    config: McpConfig,
}

impl BurrowServer {
    pub fn new(orchestrator: Orchestrator, config: McpConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            config,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Shared handle to the orchestrator, for cleanup tasks.
    pub fn orchestrator_arc(&self) -> Arc<Orchestrator> {
        Arc::clone(&self.orchestrator)
    }

    pub fn config(&self) -> &McpConfig {
        &self.config
    }

    /// Truncate sensitive content for logging.
    fn truncate_for_log(s: &str, max_len: usize) -> String {
        if s.len() <= max_len {
            return s.to_string();
        }
        let mut end = max_len;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... ({} bytes total)", &s[..end], s.len())
    }

    fn validate_size(content: &str, max: usize, field: &'static str) -> Result<(), ToolError> {
        if content.len() > max {
            return Err(ToolError::TooLarge {
                field,
                size: content.len(),
                max,
            });
        }
        Ok(())
    }

    fn parse_params<T: DeserializeOwned>(args: Option<JsonObject>) -> Result<T, ToolError> {
        let value = serde_json::Value::Object(args.unwrap_or_default());
        serde_json::from_value(value).map_err(|e| ToolError::InvalidParams(e.to_string()))
    }

    fn parse_permissions(mode: &str) -> Result<Permissions, ToolError> {
        Permissions::parse(mode).map_err(|e| ToolError::InvalidParams(e.to_string()))
    }

    /// Resolve a sandbox handle, starting the sandbox if necessary.
    async fn sandbox(&self, sandbox_id: &str) -> Result<Sandbox, ToolError> {
        if sandbox_id.trim().is_empty() {
            return Err(ToolError::InvalidParams("sandbox_id must not be empty".into()));
        }
        Ok(self
            .orchestrator
            .get_or_start(&SandboxId::new(sandbox_id.trim()))
            .await?)
    }

    fn sandbox_info(sandbox: &Sandbox) -> SandboxInfo {
        SandboxInfo {
            sandbox_id: sandbox.id().to_string(),
            state: sandbox.state().to_string(),
            labels: sandbox.labels().clone(),
            created_at: sandbox.created_at().map(|t| t.to_rfc3339()),
        }
    }

    /// Helper to create success result with JSON content
    fn json_result<T: serde::Serialize>(data: &T) -> CallToolResult {
        match serde_json::to_string_pretty(data) {
            Ok(json) => CallToolResult::success(vec![Content::text(json)]),
            Err(e) => CallToolResult::error(vec![Content::text(format!(
                "JSON serialization error: {e}"
            ))]),
        }
    }

    fn error_result(message: impl Into<String>) -> CallToolResult {
        CallToolResult::error(vec![Content::text(message.into())])
    }

    /// Convert schemars RootSchema to rmcp JsonObject
    fn schema_to_json_object<T: schemars::JsonSchema>() -> Arc<JsonObject> {
        let schema = schema_for!(T);
        let json = serde_json::to_value(&schema.schema).unwrap_or_else(|_| serde_json::json!({}));
        match json {
            serde_json::Value::Object(map) => Arc::new(map),
            _ => Arc::new(serde_json::Map::new()),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    async fn handle_create_sandbox(&self, args: Option<JsonObject>) -> ToolResult {
        let params: CreateSandboxParams = Self::parse_params(args)?;
        let password = params
            .password
            .filter(|p| !p.is_empty())
            .unwrap_or_else(generate_password);

        let mut create = CreateParams::new(password.clone());
        if let Some(project_id) = params.project_id {
            create = create.with_project(project_id);
        }

        tracing::info!(project_id = ?create.project_id, "Creating sandbox");
        let sandbox = self.orchestrator.create(&create).await?;
        tracing::info!(sandbox_id = %sandbox.id(), "Created sandbox");

        Ok(Self::json_result(&CreateSandboxResult {
            sandbox: Self::sandbox_info(&sandbox),
            password,
        }))
    }

    async fn handle_get_or_start_sandbox(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SandboxIdParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        Ok(Self::json_result(&Self::sandbox_info(&sandbox)))
    }

    async fn handle_delete_sandbox(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SandboxIdParams = Self::parse_params(args)?;
        tracing::info!(sandbox_id = %params.sandbox_id, "Deleting sandbox");

        let success = self
            .orchestrator
            .delete(&SandboxId::new(params.sandbox_id.trim()))
            .await?;
        Ok(Self::json_result(&SuccessResult { success }))
    }

    // ========================================================================
    // Process and Sessions
    // ========================================================================

    async fn handle_execute(&self, args: Option<JsonObject>) -> ToolResult {
        let params: ExecuteParams = Self::parse_params(args)?;
        Self::validate_size(&params.command, MAX_COMMAND_LENGTH, "command")?;

        let timeout = params
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_EXEC_TIMEOUT)
            .clamp(Duration::from_secs(1), MAX_EXEC_TIMEOUT);

        tracing::info!(
            sandbox_id = %params.sandbox_id,
            command = %Self::truncate_for_log(&params.command, 100),
            timeout_secs = timeout.as_secs(),
            "Running command"
        );

        let sandbox = self.sandbox(&params.sandbox_id).await?;
        let result = sandbox.process().execute(&params.command, timeout).await?;
        Ok(Self::json_result(&ExecResponse {
            exit_code: result.exit_code,
            output: result.output,
        }))
    }

    async fn handle_create_session(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SessionParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.process().create_session(&params.session_id).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    async fn handle_delete_session(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SessionParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.process().delete_session(&params.session_id).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    async fn handle_execute_session_command(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SessionCommandParams = Self::parse_params(args)?;
        Self::validate_size(&params.command, MAX_COMMAND_LENGTH, "command")?;

        tracing::info!(
            sandbox_id = %params.sandbox_id,
            session_id = %params.session_id,
            command = %Self::truncate_for_log(&params.command, 100),
            run_async = params.run_async,
            "Submitting session command"
        );

        let sandbox = self.sandbox(&params.sandbox_id).await?;
        let cmd = sandbox
            .process()
            .execute_session_command(&params.session_id, &params.command, params.run_async)
            .await?;
        Ok(Self::json_result(&SessionCommandResult {
            cmd_id: cmd.cmd_id,
            exit_code: cmd.exit_code,
        }))
    }

    async fn handle_get_session_command_logs(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SessionLogsParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        let logs = sandbox
            .process()
            .get_session_command_logs(&params.session_id, &params.command_id)
            .await?;
        Ok(Self::json_result(&SessionLogsResult { logs }))
    }

    // ========================================================================
    // Files
    // ========================================================================

    async fn handle_create_folder(&self, args: Option<JsonObject>) -> ToolResult {
        let params: CreateFolderParams = Self::parse_params(args)?;
        let mode = match params.permissions.as_deref() {
            Some(mode) => Self::parse_permissions(mode)?,
            None => Permissions::default(),
        };

        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.fs().create_folder(&params.path, &mode).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    async fn handle_upload_file(&self, args: Option<JsonObject>) -> ToolResult {
        let params: UploadFileParams = Self::parse_params(args)?;
        Self::validate_size(&params.content, MAX_INPUT_SIZE_BYTES, "content")?;

        let data = match params.encoding {
            ContentEncoding::Utf8 => Bytes::from(params.content),
            ContentEncoding::Base64 => general_purpose::STANDARD
                .decode(params.content.trim())
                .map(Bytes::from)
                .map_err(|e| ToolError::InvalidParams(format!("invalid base64 content: {e}")))?,
        };

        tracing::info!(
            sandbox_id = %params.sandbox_id,
            path = %params.path,
            bytes = data.len(),
            encoding = ?params.encoding,
            "Uploading file"
        );

        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.fs().upload_file(&params.path, data).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    async fn handle_download_file(&self, args: Option<JsonObject>) -> ToolResult {
        let params: DownloadFileParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        let data = sandbox.fs().download_file(&params.path).await?;
        let size = data.len();

        let text = match params.encoding {
            ContentEncoding::Utf8 => String::from_utf8(data.to_vec()).ok(),
            ContentEncoding::Base64 => None,
        };
        let result = match text {
            Some(content) => DownloadFileResult {
                content,
                encoding: ContentEncoding::Utf8,
                size,
            },
            None => DownloadFileResult {
                content: general_purpose::STANDARD.encode(&data),
                encoding: ContentEncoding::Base64,
                size,
            },
        };
        Ok(Self::json_result(&result))
    }

    async fn handle_delete_file(&self, args: Option<JsonObject>) -> ToolResult {
        let params: PathParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.fs().delete_file(&params.path).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    async fn handle_set_file_permissions(&self, args: Option<JsonObject>) -> ToolResult {
        let params: SetPermissionsParams = Self::parse_params(args)?;
        let mode = Self::parse_permissions(&params.permissions)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        sandbox.fs().set_file_permissions(&params.path, &mode).await?;
        Ok(Self::json_result(&SuccessResult { success: true }))
    }

    // ========================================================================
    // Preview
    // ========================================================================

    async fn handle_get_preview_link(&self, args: Option<JsonObject>) -> ToolResult {
        let params: PreviewLinkParams = Self::parse_params(args)?;
        let sandbox = self.sandbox(&params.sandbox_id).await?;
        let url = sandbox.get_preview_link(params.port).await?;
        Ok(Self::json_result(&PreviewLinkResult { url }))
    }

    /// Route a tool call by name. Failures become error results.
    pub async fn dispatch(&self, name: &str, args: Option<JsonObject>) -> CallToolResult {
        let result = match name {
            "create_sandbox" => self.handle_create_sandbox(args).await,
            "get_or_start_sandbox" => self.handle_get_or_start_sandbox(args).await,
            "delete_sandbox" => self.handle_delete_sandbox(args).await,
            "execute" => self.handle_execute(args).await,
            "create_session" => self.handle_create_session(args).await,
            "delete_session" => self.handle_delete_session(args).await,
            "execute_session_command" => self.handle_execute_session_command(args).await,
            "get_session_command_logs" => self.handle_get_session_command_logs(args).await,
            "create_folder" => self.handle_create_folder(args).await,
            "upload_file" => self.handle_upload_file(args).await,
            "download_file" => self.handle_download_file(args).await,
            "delete_file" => self.handle_delete_file(args).await,
            "set_file_permissions" => self.handle_set_file_permissions(args).await,
            "get_preview_link" => self.handle_get_preview_link(args).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(tool = name, error = %e, "Tool call failed");
            Self::error_result(e.to_string())
        })
    }

    /// Build the list of available tools
    fn build_tools_list() -> Vec<Tool> {
        vec![
            Tool::new(
                "create_sandbox",
                "Create a new sandbox and start its process supervisor. Returns the sandbox \
                 info and its display password.",
                Self::schema_to_json_object::<CreateSandboxParams>(),
            ),
            Tool::new(
                "get_or_start_sandbox",
                "Fetch a sandbox by ID, starting it first if it is stopped or archived.",
                Self::schema_to_json_object::<SandboxIdParams>(),
            ),
            Tool::new(
                "delete_sandbox",
                "Permanently delete a sandbox.",
                Self::schema_to_json_object::<SandboxIdParams>(),
            ),
            Tool::new(
                "execute",
                "Run a shell command to completion and return its exit code and output.",
                Self::schema_to_json_object::<ExecuteParams>(),
            ),
            Tool::new(
                "create_session",
                "Start a named interactive session for long-running commands.",
                Self::schema_to_json_object::<SessionParams>(),
            ),
            Tool::new(
                "delete_session",
                "Terminate a named session.",
                Self::schema_to_json_object::<SessionParams>(),
            ),
            Tool::new(
                "execute_session_command",
                "Submit a command into a session. Returns a command id for log retrieval.",
                Self::schema_to_json_object::<SessionCommandParams>(),
            ),
            Tool::new(
                "get_session_command_logs",
                "Read the accumulated output of a session command.",
                Self::schema_to_json_object::<SessionLogsParams>(),
            ),
            Tool::new(
                "create_folder",
                "Create a directory (and parents) with the given permissions.",
                Self::schema_to_json_object::<CreateFolderParams>(),
            ),
            Tool::new(
                "upload_file",
                "Write content to a file in the sandbox. Set encoding to \"base64\" for binary data.",
                Self::schema_to_json_object::<UploadFileParams>(),
            ),
            Tool::new(
                "download_file",
                "Read a file from the sandbox. Binary content is returned base64-encoded.",
                Self::schema_to_json_object::<DownloadFileParams>(),
            ),
            Tool::new(
                "delete_file",
                "Delete a file from the sandbox.",
                Self::schema_to_json_object::<PathParams>(),
            ),
            Tool::new(
                "set_file_permissions",
                "Change a file's permission bits (octal, e.g. \"644\").",
                Self::schema_to_json_object::<SetPermissionsParams>(),
            ),
            Tool::new(
                "get_preview_link",
                "Get the public URL for a port exposed inside the sandbox.",
                Self::schema_to_json_object::<PreviewLinkParams>(),
            ),
        ]
    }
}

// ============================================================================
// ServerHandler Implementation
// ============================================================================

impl ServerHandler for BurrowServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Burrow MCP Server - Provision sandboxes and run commands inside them. \
                 Use create_sandbox or get_or_start_sandbox to obtain a sandbox_id, then \
                 execute for one-shot commands or create_session + execute_session_command \
                 for long-running ones. Use the file tools to move data in and out."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: Self::build_tools_list(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(self.dispatch(request.name.as_ref(), request.arguments).await)
    }
}
