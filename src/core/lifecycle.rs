// src/core/lifecycle.rs

//! Teardown of a connection's registry state. Runs exactly once per connection,
//! from `ConnectionGuard::drop`.

use crate::core::protocol::ServerMessage;
use crate::core::registry::{ConnectionId, ConnectionInfo, Registry};
use tracing::debug;

/// What teardown did, for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReport {
    /// The connection's last registry record.
    pub record: ConnectionInfo,
    /// The partner that was told `DISCONNECTED` and unbound, if any.
    pub notified_partner: Option<ConnectionId>,
    /// How many unredeemed codes were released.
    pub released_codes: usize,
}

/// Removes `id`, notifies and unbinds its partner, and releases its codes, all
/// in one registry transaction. Returns `None` if `id` was already removed.
pub fn disconnect(registry: &Registry, id: ConnectionId) -> Option<DisconnectReport> {
    let mut txn = registry.lock();
    let record = txn.remove(id)?;

    let notified_partner = match record.partner_id {
        Some(partner) if txn.partner_of(partner) == Some(id) => {
            // Only a closed partner queue refuses this; teardown carries on
            // either way.
            let delivery = txn.deliver(partner, ServerMessage::Disconnected);
            if !delivery.is_queued() {
                debug!(
                    "DISCONNECTED for connection {} not delivered: {:?}",
                    partner, delivery
                );
            }
            txn.unbind_one(partner);
            Some(partner)
        }
        _ => None,
    };

    let released_codes = txn.release_code_for(id);

    Some(DisconnectReport {
        record,
        notified_partner,
        released_codes,
    })
}
