// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::lifecycle;
use crate::core::registry::ConnectionId;
use crate::core::state::ServerState;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

/// An RAII guard that tears down a connection's registry state when the
/// handler's scope is exited, whether by close frame, transport error,
/// shutdown or panic.
pub struct ConnectionGuard {
    state: Arc<ServerState>,
    conn_id: ConnectionId,
    addr: SocketAddr,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<ServerState>, conn_id: ConnectionId, addr: SocketAddr) -> Self {
        Self {
            state,
            conn_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        match lifecycle::disconnect(&self.state.registry, self.conn_id) {
            Some(report) => {
                if let Some(partner) = report.notified_partner {
                    info!(
                        "Connection {} ({}) left its room; partner {} notified.",
                        self.conn_id, self.addr, partner
                    );
                }
                debug!(
                    "Cleaned up connection {} ({}), released {} pairing code(s).",
                    self.conn_id, self.addr, report.released_codes
                );
            }
            None => debug!(
                "Connection {} ({}) was already gone from the registry upon cleanup.",
                self.conn_id, self.addr
            ),
        }
    }
}
