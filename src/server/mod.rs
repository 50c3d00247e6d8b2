// src/server/mod.rs

use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod routes;
mod spawner;

pub use routes::{AppState, app};

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize server state and bind the listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut server_context).await?;

    // 3. Serve until shutdown.
    connection_loop::run(server_context).await
}

/// Serves the HTTP/WebSocket app on `listener` until `shutdown_tx` fires.
///
/// Upgraded connections are not waited for here; each one hears the same
/// shutdown signal and closes itself, and `state.connection_tasks` tracks them.
pub async fn serve(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
) -> std::io::Result<()> {
    let mut shutdown_rx = shutdown_tx.subscribe();
    let app = app(state, shutdown_tx);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_rx.recv().await.ok();
    })
    .await
}
