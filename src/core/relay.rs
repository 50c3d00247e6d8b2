// src/core/relay.rs

//! The relay engine: liveness replies and best-effort forwarding of payloads
//! to a bound partner.

use crate::core::metrics;
use crate::core::protocol::ServerMessage;
use crate::core::registry::{ConnectionId, Delivery, Registry};
use tracing::debug;

/// What happened to a payload handed to [`RelayEngine::relay`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Queued on the partner's outbound queue.
    Forwarded(ConnectionId),
    /// The sender has no partner. Silently dropped.
    Unpaired,
    /// The sender's partner is gone or its queue is closed. Silently dropped.
    PartnerGone,
    /// The partner's outbound queue is full. Silently dropped.
    PartnerBusy,
    /// Empty or whitespace-only payloads are never relayed.
    Empty,
}

impl RelayOutcome {
    pub fn is_forwarded(&self) -> bool {
        matches!(self, RelayOutcome::Forwarded(_))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RelayEngine<'a> {
    registry: &'a Registry,
}

impl<'a> RelayEngine<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Answers a `PING` with `PONG`.
    pub fn ping(&self, from: ConnectionId) -> Delivery {
        self.registry.deliver(from, ServerMessage::Pong)
    }

    /// Forwards `payload` verbatim to `from`'s partner. Nothing is ever sent
    /// back to the sender.
    pub fn relay(&self, from: ConnectionId, payload: String) -> RelayOutcome {
        if payload.trim().is_empty() {
            return RelayOutcome::Empty;
        }
        let size = payload.len();

        let outcome = {
            let txn = self.registry.lock();
            match txn.partner_of(from) {
                None => RelayOutcome::Unpaired,
                Some(partner) => match txn.deliver(partner, ServerMessage::Payload(payload)) {
                    Delivery::Queued => RelayOutcome::Forwarded(partner),
                    Delivery::QueueFull => RelayOutcome::PartnerBusy,
                    Delivery::Closed => RelayOutcome::PartnerGone,
                },
            }
        };

        if outcome.is_forwarded() {
            metrics::PAYLOADS_RELAYED_TOTAL.inc();
            metrics::PAYLOAD_SIZE_BYTES.observe(size as f64);
        } else {
            metrics::PAYLOADS_DROPPED_TOTAL.inc();
            debug!("Payload of {} bytes from connection {} dropped: {:?}", size, from, outcome);
        }
        outcome
    }
}
