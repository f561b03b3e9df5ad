//! SQLite read-only MCP server entry point.
//!
//! Serves the database named by `DB_FILE` over streamable HTTP (default) or
//! stdio, selected with `MCP_TRANSPORT`.
//!
//! Features:
//! - Graceful shutdown on SIGTERM, SIGHUP and Ctrl+C
//! - Database handle closed on exit

use anyhow::Result;
use rmcp::ServiceExt;
use sqlite_readonly_mcp_server::database::ConnectionManager;
use sqlite_readonly_mcp_server::shutdown::{
    install_signal_handlers, new_shutdown_controller, SharedShutdownController,
};
use sqlite_readonly_mcp_server::tools::ToolName;
use sqlite_readonly_mcp_server::transport::TransportType;
use sqlite_readonly_mcp_server::{Config, SqliteMcpServer};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the stdio transport.
    init_logging();

    info!(
        "SQLite read-only MCP server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    std::panic::set_hook(Box::new(|info| {
        error!("[PANIC] {}", info);
    }));

    let config = Config::from_env()?;
    info!("Database file: {}", config.database.path.display());
    info!("Transport: {}", config.transport.transport_type);

    let server = SqliteMcpServer::connect(&config.database)?;
    let db = server.database().clone();
    let tools: Vec<&str> = ToolName::ALL.iter().map(ToolName::as_str).collect();
    info!("Serving read-only tools: {}", tools.join(", "));

    let shutdown_controller = new_shutdown_controller();
    install_signal_handlers(shutdown_controller.clone()).await;

    match config.transport.transport_type {
        TransportType::Stdio => serve_stdio(server, &db, &shutdown_controller).await?,
        #[cfg(feature = "http")]
        TransportType::Http => {
            serve_http(server, config.transport.http, &db, &shutdown_controller).await?
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Serve over stdio until the client disconnects or a signal arrives.
async fn serve_stdio(
    server: SqliteMcpServer,
    db: &ConnectionManager,
    shutdown_controller: &SharedShutdownController,
) -> Result<()> {
    let service = server.serve(rmcp::transport::stdio()).await?;
    info!("Ready to accept requests on stdio");

    let mut shutdown_signal = shutdown_controller.signal();
    tokio::select! {
        quit_reason = service.waiting() => {
            match quit_reason {
                Ok(reason) => info!("Service stopped: {:?}", reason),
                Err(e) => error!("Service error: {}", e),
            }
        }
        _ = shutdown_signal.recv() => {
            info!("Shutdown signal received");
        }
    }

    shutdown_controller.graceful_shutdown(db, async {}).await;
    Ok(())
}

/// Serve streamable HTTP until a signal arrives or the listener fails.
#[cfg(feature = "http")]
async fn serve_http(
    server: SqliteMcpServer,
    http: sqlite_readonly_mcp_server::transport::HttpConfig,
    db: &ConnectionManager,
    shutdown_controller: &SharedShutdownController,
) -> Result<()> {
    use sqlite_readonly_mcp_server::transport::http_server::start_http_server;

    let mut transport = tokio::spawn(start_http_server(
        server,
        http,
        shutdown_controller.signal(),
    ));

    let mut shutdown_signal = shutdown_controller.signal();
    let finished = tokio::select! {
        joined = &mut transport => Some(joined),
        _ = shutdown_signal.recv() => {
            info!("Shutdown signal received");
            None
        }
    };

    let outcome = match finished {
        Some(joined) => {
            shutdown_controller.graceful_shutdown(db, async {}).await;
            joined
        }
        None => {
            let stopped = async {
                match (&mut transport).await {
                    Ok(Ok(())) => info!("HTTP server stopped"),
                    Ok(Err(e)) => error!("HTTP server error: {}", e),
                    Err(e) => error!("HTTP transport task failed: {}", e),
                }
            };
            shutdown_controller.graceful_shutdown(db, stopped).await;
            transport.abort();
            Ok(Ok(()))
        }
    };

    outcome??;
    Ok(())
}

/// Initialize tracing subscriber with stderr output.
fn init_logging() {
    let filter = std::env::var("RUST_LOG")
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new("warn,sqlite_readonly_mcp_server=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}
