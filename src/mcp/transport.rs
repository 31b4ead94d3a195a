// file: src/mcp/transport.rs
// description: stdio and stateless streamable HTTP transports for the MCP server
// reference: https://docs.rs/rmcp

use crate::error::{KbError, Result};
use crate::mcp::KnowledgeBaseMcp;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Serves on stdin/stdout until the client disconnects.
pub async fn serve_stdio(server: KnowledgeBaseMcp) -> Result<()> {
    info!("Starting stdio transport");

    let service = server
        .serve(stdio())
        .await
        .map_err(|e| KbError::Transport(e.to_string()))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| KbError::Transport(e.to_string()))?;

    info!("stdio session ended: {:?}", reason);
    Ok(())
}

/// Serves stateless streamable HTTP under `path` until Ctrl-C.
pub async fn serve_streamable_http(
    server: KnowledgeBaseMcp,
    host: &str,
    port: u16,
    path: &str,
) -> Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        StreamableHttpServerConfig {
            stateful_mode: false,
            ..Default::default()
        },
    );

    let router = axum::Router::new().nest_service(path, service);
    let listener = TcpListener::bind((host, port)).await?;
    info!(
        "Streamable HTTP transport listening on http://{}{}",
        listener.local_addr()?,
        path
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP transport stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
