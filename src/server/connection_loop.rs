// src/server/connection_loop.rs

//! Contains the main server loop: serving HTTP/WebSocket traffic and handling
//! graceful shutdown.

use super::context::ServerContext;
use anyhow::anyhow;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// Serves until a signal arrives or a critical task fails, then shuts down.
pub async fn run(mut ctx: ServerContext) -> anyhow::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let mut server_task = tokio::spawn(super::serve(
        ctx.listener,
        ctx.state.clone(),
        ctx.shutdown_tx.clone(),
    ));
    let mut server_finished = false;

    loop {
        tokio::select! {
            biased;

            _ = sigint.recv() => {
                info!("SIGINT received, initiating graceful shutdown.");
                break;
            }
            _ = sigterm.recv() => {
                info!("SIGTERM received, initiating graceful shutdown.");
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            res = &mut server_task => {
                server_finished = true;
                match res {
                    Ok(Ok(())) => warn!("HTTP server stopped unexpectedly."),
                    Ok(Err(e)) => error!("CRITICAL: HTTP server failed: {}. Shutting down.", e),
                    Err(e) => error!("CRITICAL: HTTP server task panicked: {e:?}. Shutting down."),
                }
                break;
            }
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No task was listening for the shutdown signal.");
    }

    if !server_finished {
        match server_task.await {
            Ok(Ok(())) => info!("HTTP server stopped accepting connections."),
            Ok(Err(e)) => error!("HTTP server exited with error during shutdown: {}", e),
            Err(e) => error!("HTTP server task panicked during shutdown: {e:?}"),
        }
    }

    let grace = Duration::from_millis(ctx.state.config.shutdown_grace_period_ms);
    let tracker = ctx.state.connection_tasks.clone();
    tracker.close();
    info!("Waiting for {} client connection(s) to close...", tracker.len());
    if tokio::time::timeout(grace, tracker.wait()).await.is_err() {
        warn!(
            "Timed out waiting for client connections; {} still open.",
            ctx.state.registry.len()
        );
    } else {
        info!("All client connections closed.");
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Server shutdown complete.");
    Ok(())
}
