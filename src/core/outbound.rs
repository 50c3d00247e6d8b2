// src/core/outbound.rs

//! Per-connection outbound queue.
//!
//! One FIFO carries everything the server writes to a client, so messages
//! arrive in the order they were queued. Only relayed payloads count against
//! the queue's capacity. Control messages (`CODE:`, `CONNECTED`, `PONG`,
//! `ERROR:`, `DISCONNECTED`) are always accepted while the receiver is alive;
//! each is produced at most once per client request or pairing transition.

use crate::core::protocol::ServerMessage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::{self, error::TryRecvError};

/// The result of handing a message to a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// The payload budget is used up; the payload was discarded.
    QueueFull,
    /// The connection is gone or its handler has stopped draining.
    Closed,
}

impl Delivery {
    pub fn is_queued(self) -> bool {
        self == Delivery::Queued
    }
}

/// Creates a queue that holds at most `payload_capacity` undrained payloads.
pub fn outbound_queue(payload_capacity: usize) -> (PeerSender, PeerReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queued_payloads = Arc::new(AtomicUsize::new(0));
    (
        PeerSender {
            tx,
            queued_payloads: queued_payloads.clone(),
            payload_capacity,
        },
        PeerReceiver {
            rx,
            queued_payloads,
        },
    )
}

/// The registry's handle on a connection's transport. The connection's
/// handler owns the socket and drains the matching [`PeerReceiver`].
#[derive(Debug, Clone)]
pub struct PeerSender {
    tx: mpsc::UnboundedSender<ServerMessage>,
    queued_payloads: Arc<AtomicUsize>,
    payload_capacity: usize,
}

impl PeerSender {
    /// Queues `message` without waiting.
    pub fn try_send(&self, message: ServerMessage) -> Delivery {
        if self.tx.is_closed() {
            return Delivery::Closed;
        }
        let is_payload = message.is_payload();
        if is_payload {
            let reserved = self
                .queued_payloads
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |queued| {
                    (queued < self.payload_capacity).then_some(queued + 1)
                });
            if reserved.is_err() {
                return Delivery::QueueFull;
            }
        }
        match self.tx.send(message) {
            Ok(()) => Delivery::Queued,
            Err(_) => {
                if is_payload {
                    self.queued_payloads.fetch_sub(1, Ordering::AcqRel);
                }
                Delivery::Closed
            }
        }
    }
}

/// The draining half of an outbound queue.
#[derive(Debug)]
pub struct PeerReceiver {
    rx: mpsc::UnboundedReceiver<ServerMessage>,
    queued_payloads: Arc<AtomicUsize>,
}

impl PeerReceiver {
    pub async fn recv(&mut self) -> Option<ServerMessage> {
        let message = self.rx.recv().await?;
        Some(self.released(message))
    }

    pub fn try_recv(&mut self) -> Result<ServerMessage, TryRecvError> {
        self.rx.try_recv().map(|message| self.released(message))
    }

    /// Number of payloads queued and not yet drained.
    pub fn queued_payloads(&self) -> usize {
        self.queued_payloads.load(Ordering::Acquire)
    }

    fn released(&self, message: ServerMessage) -> ServerMessage {
        if message.is_payload() {
            self.queued_payloads.fetch_sub(1, Ordering::AcqRel);
        }
        message
    }
}
