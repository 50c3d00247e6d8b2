// src/core/tasks/code_sweeper.rs

//! A background task that removes unredeemed pairing codes once they outlive
//! the configured TTL.

use crate::core::state::ServerState;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, info};

pub struct CodeSweeperTask {
    state: Arc<ServerState>,
    interval: Duration,
}

impl CodeSweeperTask {
    pub fn new(state: Arc<ServerState>) -> Self {
        let interval = Duration::from_secs(state.config.pairing.sweep_interval_seconds.max(1));
        Self { state, interval }
    }

    /// The main run loop. Sweeps on every tick until shutdown.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Pairing code sweeper started (interval {:?}).",
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let swept = self.state.registry.sweep_expired_codes(Instant::now());
                    if swept > 0 {
                        debug!("Swept {} expired pairing code(s).", swept);
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Pairing code sweeper shutting down.");
                    return;
                }
            }
        }
    }
}
