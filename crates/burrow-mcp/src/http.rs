//! Streamable HTTP transport for remote AI agents.
//!
//! ## Endpoints
//!
//! - `POST /mcp` - JSON-RPC requests
//! - `GET /mcp` - SSE stream for server-initiated messages
//! - `GET /health` - Health check
//! - `GET /` - Server info

use crate::server::BurrowServer;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the HTTP router for the MCP server.
pub fn build_router(server: BurrowServer) -> Router {
    let backend = server.orchestrator().backend().kind();
    let session_manager = Arc::new(LocalSessionManager::default());

    let mcp_service = StreamableHttpService::new(
        move || Ok(server.clone()),
        session_manager,
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .route("/health", get(health_handler))
        .route("/", get(root_handler))
        .with_state(backend)
        .fallback_service(mcp_service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_handler(State(backend): State<&'static str>) -> impl IntoResponse {
    tracing::trace!("Health check request");
    Json(serde_json::json!({
        "status": "healthy",
        "service": "burrow-mcp",
        "backend": backend,
    }))
}

async fn root_handler() -> impl IntoResponse {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Burrow MCP Server</title>
    <style>
        body { font-family: system-ui; max-width: 800px; margin: 50px auto; padding: 20px; }
        code { background: #f4f4f4; padding: 2px 6px; border-radius: 3px; }
    </style>
</head>
<body>
    <h1>Burrow MCP Server</h1>
    <p>Model Context Protocol server for remote and local sandboxes.</p>

    <h2>Endpoints</h2>
    <ul>
        <li><code>POST /mcp</code> - MCP JSON-RPC requests</li>
        <li><code>GET /mcp</code> - SSE stream for server messages</li>
        <li><code>GET /health</code> - Health check</li>
    </ul>

    <h2>Tools</h2>
    <ul>
        <li><code>create_sandbox</code>, <code>get_or_start_sandbox</code>, <code>delete_sandbox</code></li>
        <li><code>execute</code>, <code>create_session</code>, <code>delete_session</code>,
            <code>execute_session_command</code>, <code>get_session_command_logs</code></li>
        <li><code>create_folder</code>, <code>upload_file</code>, <code>download_file</code>,
            <code>delete_file</code>, <code>set_file_permissions</code></li>
        <li><code>get_preview_link</code></li>
    </ul>
</body>
</html>"#,
    )
}

/// Serve HTTP until `shutdown` resolves.
pub async fn serve(
    server: BurrowServer,
    addr: std::net::SocketAddr,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let router = build_router(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP transport listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
