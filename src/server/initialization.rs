// src/server/initialization.rs

//! Builds the shared state and binds the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", config.host, config.port))?;
    info!(
        "Uniclip server listening on ws://{}:{}/ws",
        config.host, config.port
    );

    let state = ServerState::new(config);
    info!("Server state initialized.");

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!("Starting Uniclip v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "max_clients={}, max_message_size={} bytes, code_length={}",
        config.max_clients, config.max_message_size, config.pairing.code_length
    );
    if config.pairing.code_ttl_seconds == 0 {
        info!("Pairing codes live until redeemed or until their host disconnects.");
    }
}
