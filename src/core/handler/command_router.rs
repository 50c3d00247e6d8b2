// src/core/handler/command_router.rs

//! Routes a classified client frame to the pairing coordinator or the relay engine.
//!
//! Replies are never written to the socket from here. Everything goes onto the
//! connection's outbound queue through the registry, so a connection sees its
//! messages in exactly the order the registry produced them.

use crate::core::errors::UniclipError;
use crate::core::pairing::PairingCoordinator;
use crate::core::protocol::ClientCommand;
use crate::core::registry::ConnectionId;
use crate::core::relay::{RelayEngine, RelayOutcome};
use crate::core::state::ServerState;
use std::sync::Arc;
use tracing::debug;

/// What the router did with a frame, for the handler's logs and for tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteResponse {
    /// `CODE:` was queued to the sender.
    CodeIssued(String),
    /// `CONNECTED` was queued to both sides.
    Paired { host: ConnectionId },
    /// `PONG` was queued to the sender.
    Ponged,
    Relayed(RelayOutcome),
    /// Empty frame; nothing happened.
    NoOp,
}

/// The `Router` directs one connection's frames to the right component.
pub struct Router {
    state: Arc<ServerState>,
    conn_id: ConnectionId,
}

impl Router {
    pub fn new(state: Arc<ServerState>, conn_id: ConnectionId) -> Self {
        Self { state, conn_id }
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    /// Handles one frame. Protocol errors come back as `Err` for the caller to
    /// report; see [`UniclipError::is_protocol_error`].
    pub fn route(&self, command: ClientCommand) -> Result<RouteResponse, UniclipError> {
        debug!(
            "Connection {}: routing {} frame.",
            self.conn_id,
            command.name()
        );
        let registry = &self.state.registry;
        match command {
            ClientCommand::Open => {
                let code = PairingCoordinator::new(registry).open(self.conn_id)?;
                Ok(RouteResponse::CodeIssued(code))
            }
            ClientCommand::Join(code) => {
                let host = PairingCoordinator::new(registry).join(self.conn_id, &code)?;
                Ok(RouteResponse::Paired { host })
            }
            ClientCommand::Ping => {
                RelayEngine::new(registry).ping(self.conn_id);
                Ok(RouteResponse::Ponged)
            }
            ClientCommand::Payload(text) => {
                let outcome = RelayEngine::new(registry).relay(self.conn_id, text);
                Ok(RouteResponse::Relayed(outcome))
            }
            ClientCommand::Empty => Ok(RouteResponse::NoOp),
        }
    }
}
