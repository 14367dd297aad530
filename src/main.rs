//! OpenStack MCP Server Entry Point
//!
//! Loads configuration, initializes logging, wires shutdown signals and runs
//! the server with the configured transport.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use openstack_mcp_server::cli::{Cli, Command};
use openstack_mcp_server::core::{Config, McpServer};
use openstack_mcp_server::domains::storage::InMemoryBlockStorage;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Version = cli.command() {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut config = Config::from_env()?;
    cli.apply(&mut config);
    config.validate()?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);

    let grace = config.shutdown_grace();
    let server = McpServer::new(config, Arc::new(InMemoryBlockStorage::new()))?;

    let token = server.shutdown_token();
    tokio::spawn(shutdown_signal(token.clone()));

    server.start().await?;

    let outcome = tokio::select! {
        result = server.wait() => result,
        _ = token.cancelled() => {
            info!("Shutdown requested");
            Ok(())
        }
    };

    server.shutdown(grace).await?;
    info!("Server shutting down");

    outcome?;
    Ok(())
}

/// Cancel `token` on Ctrl+C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
    token.cancel();
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the stdio protocol.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
