// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use crate::config::Config;
use crate::core::pairing::CodeGenerator;
use crate::core::registry::Registry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use tracing::info;

/// The central struct holding all shared, server-wide state.
/// It is wrapped in an `Arc` and handed to every connection handler and
/// background task; no connection reaches another connection except through
/// the registry's operations.
#[derive(Debug)]
pub struct ServerState {
    /// The resolved configuration. Fixed for the process lifetime.
    pub config: Config,
    /// Live connections, partner bindings and outstanding pairing codes.
    pub registry: Registry,
    /// One permit per live WebSocket connection, sized by `max_clients`.
    pub connection_permits: Arc<Semaphore>,
    /// Tracks every spawned connection task so shutdown can wait for them.
    pub connection_tasks: TaskTracker,
}

impl ServerState {
    pub fn new(config: Config) -> Arc<Self> {
        let generator = CodeGenerator::new(
            config.pairing.code_length,
            config.pairing.max_generation_attempts,
        );
        let code_ttl = match config.pairing.code_ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        if let Some(ttl) = code_ttl {
            info!("Unredeemed pairing codes expire after {:?}.", ttl);
        }

        Arc::new(Self {
            registry: Registry::new(generator, code_ttl),
            connection_permits: Arc::new(Semaphore::new(config.max_clients)),
            connection_tasks: TaskTracker::new(),
            config,
        })
    }
}
