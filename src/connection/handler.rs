// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a client connection.

use super::guard::ConnectionGuard;
use crate::core::handler::command_router::Router;
use crate::core::protocol::{ClientCommand, ServerMessage};
use crate::core::registry::{ConnectionId, outbound_queue};
use crate::core::state::ServerState;
use crate::core::{UniclipError, metrics};
use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::SinkExt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Manages the full lifecycle of a client connection.
///
/// The handler is the only owner of the socket. Inbound frames are routed in
/// arrival order; outbound messages arrive on a queue whose sender lives in
/// the registry, and are written in the order they were queued. The queue
/// bounds relayed payloads only.
pub struct ConnectionHandler {
    socket: WebSocket,
    addr: SocketAddr,
    state: Arc<ServerState>,
    global_shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler` for an upgraded socket.
    pub fn new(
        socket: WebSocket,
        addr: SocketAddr,
        state: Arc<ServerState>,
        global_shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            socket,
            addr,
            state,
            global_shutdown_rx,
        }
    }

    /// Registers the connection, runs its receive loop until the peer leaves or
    /// the server shuts down, then tears it down.
    pub async fn run(mut self) -> Result<(), UniclipError> {
        let conn_id = self.state.registry.next_id();
        let (outbound_tx, mut outbound_rx) =
            outbound_queue(self.state.config.outbound_queue_capacity);
        self.state
            .registry
            .register(conn_id, self.addr, outbound_tx)?;
        let _guard = ConnectionGuard::new(self.state.clone(), conn_id, self.addr);
        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
        info!("Connection {} registered for {}.", conn_id, self.addr);

        let router = Router::new(self.state.clone(), conn_id);

        let result = 'main_loop: loop {
            tokio::select! {
                // Prioritize shutdown, then drain outbound before reading more.
                biased;
                _ = self.global_shutdown_rx.recv() => {
                    info!("Connection {} received GLOBAL shutdown signal.", conn_id);
                    let goodbye = Message::Close(Some(CloseFrame {
                        code: close_code::AWAY,
                        reason: "Server is shutting down".into(),
                    }));
                    let _ = self.socket.send(goodbye).await;
                    break 'main_loop Ok(());
                }
                Some(message) = outbound_rx.recv() => {
                    if let Err(e) = self.write(conn_id, message).await {
                        break 'main_loop Err(e);
                    }
                }
                inbound = self.socket.recv() => {
                    match inbound {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.process_text(&router, text.as_str().to_owned()) {
                                break 'main_loop Err(e);
                            }
                        }
                        Some(Ok(Message::Binary(data))) => {
                            let text = match std::str::from_utf8(&data) {
                                Ok(text) => text.to_owned(),
                                Err(e) => {
                                    warn!("Connection {} sent a non-UTF-8 binary frame; closing.", conn_id);
                                    break 'main_loop Err(e.into());
                                }
                            };
                            if let Err(e) = self.process_text(&router, text) {
                                break 'main_loop Err(e);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("Connection {} sent close frame: {:?}", conn_id, frame);
                            break 'main_loop Ok(());
                        }
                        Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                        Some(Err(e)) => {
                            debug!("Connection {} from {} dropped: {}", conn_id, self.addr, e);
                            break 'main_loop Ok(());
                        }
                        None => {
                            debug!("Connection {} from {} closed by peer.", conn_id, self.addr);
                            break 'main_loop Ok(());
                        }
                    }
                }
            }
        };

        // Flushes a pending close acknowledgment; fails harmlessly if the
        // socket is already gone.
        let _ = self.socket.close().await;
        result
    }

    /// Classifies one inbound text frame and routes it. Protocol errors are
    /// answered with `ERROR:`; anything else ends the connection.
    fn process_text(&self, router: &Router, text: String) -> Result<(), UniclipError> {
        let command = ClientCommand::parse(text);
        match router.route(command) {
            Ok(response) => {
                debug!("Connection {}: {:?}", router.conn_id(), response);
                Ok(())
            }
            Err(e) if e.is_protocol_error() => {
                self.send_error_to_client(router.conn_id(), e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Queues an `ERROR:` reply behind anything already waiting for this client.
    fn send_error_to_client(&self, conn_id: ConnectionId, e: UniclipError) {
        let reply = ServerMessage::Error(e.to_string());
        debug!("Connection {}: sending error response: {}", conn_id, reply);
        self.state.registry.deliver(conn_id, reply);
    }

    async fn write(&mut self, conn_id: ConnectionId, message: ServerMessage) -> Result<(), UniclipError> {
        if !message.is_payload() {
            debug!("Connection {}: sending {}", conn_id, message);
        }
        self.socket
            .send(Message::Text(message.into_wire().into()))
            .await
            .map_err(UniclipError::from)
    }
}
