//! Burrow MCP Server entry point.
//!
//! Starts stdio and/or streamable HTTP transports depending on
//! `BURROW_TRANSPORT`, and shuts both down on Ctrl-C.

use burrow_core::{Backend, Orchestrator};
use burrow_mcp::{http, BurrowServer, McpConfig, TransportMode};
use rmcp::transport::stdio;
use rmcp::ServiceExt;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout is the MCP transport.
    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("burrow_mcp=info".parse()?)
                .add_directive("burrow_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Burrow MCP Server");

    let config = McpConfig::from_env();
    tracing::info!(?config, "Configuration loaded");
    config.validate_warn();

    let orchestrator = Orchestrator::from_config(&config.sandbox)?;
    let server = BurrowServer::new(orchestrator, config.clone());

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let cleanup = server.orchestrator_arc();
    let mut handles = Vec::new();

    if config.transport_mode.http_enabled() {
        let http_server = server.clone();
        let http_addr = config.http_addr;
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(e) = http::serve(http_server, http_addr, shutdown).await {
                tracing::error!(error = %e, "HTTP server error");
            }
        }));
    }

    if config.transport_mode.stdio_enabled() {
        let stdio_server = server.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            match stdio_server.serve(stdio()).await {
                Ok(service) => {
                    tokio::select! {
                        result = service.waiting() => {
                            if let Err(e) = result {
                                tracing::error!(error = %e, "Stdio service error");
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Stdio transport shutting down");
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start stdio transport");
                }
            }
        }));
    }

    match config.transport_mode {
        TransportMode::Both => {
            tracing::info!(http_addr = %config.http_addr, "Server ready (stdio + HTTP)")
        }
        TransportMode::Http => {
            tracing::info!(http_addr = %config.http_addr, "Server ready (HTTP only)")
        }
        TransportMode::Stdio => tracing::info!("Server ready (stdio only)"),
    }

    signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, cleaning up...");
    let _ = shutdown_tx.send(());

    // Remote sandboxes outlive the server; only the local one is ours.
    if let Backend::Local(local) = cleanup.backend() {
        if config.teardown_on_exit && local.current().await.is_some() {
            local.teardown().await;
        }
    }

    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}
