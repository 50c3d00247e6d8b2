// src/core/pairing/coordinator.rs

//! Turns `OPEN:` and `JOIN:` into registry transitions.

use crate::core::errors::UniclipError;
use crate::core::metrics;
use crate::core::protocol::ServerMessage;
use crate::core::registry::{ConnectionId, Registry};
use tracing::{debug, info};

/// Stateless front for the pairing half of the protocol. Each operation runs
/// inside a single registry transaction.
#[derive(Debug, Clone, Copy)]
pub struct PairingCoordinator<'a> {
    registry: &'a Registry,
}

impl<'a> PairingCoordinator<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// Issues a new code for `host` and queues `CODE:<code>` to it.
    ///
    /// A host that already holds a code gets another one; the earlier code
    /// stays redeemable until used or until the host disconnects.
    pub fn open(&self, host: ConnectionId) -> Result<String, UniclipError> {
        let mut txn = self.registry.lock();
        let code = txn.issue_code(host)?;
        txn.deliver(host, ServerMessage::Code(code.clone()));
        debug!("Connection {} opened a room with a new code.", host);
        Ok(code)
    }

    /// Redeems `code` for `joiner` and binds the two connections.
    ///
    /// The code is consumed whatever the outcome. On success `CONNECTED` is
    /// queued to the joiner first, then the host. Returns the host's id.
    pub fn join(&self, joiner: ConnectionId, code: &str) -> Result<ConnectionId, UniclipError> {
        let code = code.trim();
        let mut txn = self.registry.lock();

        let result = match txn.redeem_code(code) {
            None => Err(UniclipError::InvalidOrExpiredCode),
            Some(host) if host == joiner => Err(UniclipError::InvalidOrExpiredCode),
            Some(host) => match txn.get(host) {
                Some(record) if record.partner_id.is_none() => {
                    if txn.partner_of(joiner).is_some() {
                        Err(UniclipError::AlreadyPaired)
                    } else {
                        txn.bind(joiner, host).map(|()| host)
                    }
                }
                _ => Err(UniclipError::InvalidOrExpiredCode),
            },
        };

        match result {
            Ok(host) => {
                txn.deliver(joiner, ServerMessage::Connected);
                txn.deliver(host, ServerMessage::Connected);
                drop(txn);
                metrics::PAIRINGS_TOTAL.inc();
                info!("Connections {} and {} are now paired.", joiner, host);
                Ok(host)
            }
            Err(e) => {
                drop(txn);
                metrics::FAILED_JOINS_TOTAL.inc();
                debug!("JOIN from connection {} rejected: {}", joiner, e);
                Err(e)
            }
        }
    }
}
