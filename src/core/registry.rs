// src/core/registry.rs

//! The connection registry: the single source of truth for which connections are
//! live, who is paired with whom, and which pairing codes are outstanding.
//!
//! All state sits behind one `parking_lot::Mutex`. Single operations lock for
//! their own duration; multi-step transitions (redeem-then-bind, remove-then-notify)
//! take a [`RegistryTxn`] so the whole transition is atomic with respect to every
//! other connection. The lock is never held across an `.await`: delivery onto a
//! peer's outbound queue never waits.

use crate::core::errors::UniclipError;
use crate::core::metrics;
use crate::core::pairing::code::CodeGenerator;
use crate::core::protocol::ServerMessage;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub use crate::core::outbound::{Delivery, PeerReceiver, PeerSender, outbound_queue};

/// Opaque per-connection identifier, unique for the process lifetime.
pub type ConnectionId = u64;

#[derive(Debug)]
struct ConnectionEntry {
    sender: PeerSender,
    addr: SocketAddr,
    partner_id: Option<ConnectionId>,
    connected_at: Instant,
}

#[derive(Debug, Clone, Copy)]
struct IssuedCode {
    host_id: ConnectionId,
    issued_at: Instant,
}

/// A snapshot of one connection's registry record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub partner_id: Option<ConnectionId>,
    pub connected_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionEntry>,
    codes: HashMap<String, IssuedCode>,
    /// Reverse index for O(1) release of a host's unredeemed codes.
    codes_by_host: HashMap<ConnectionId, HashSet<String>>,
    /// Number of mutually bound pairs.
    rooms: usize,
}

/// Process-wide connection and code state. Owned by `ServerState`.
#[derive(Debug)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
    next_id: AtomicU64,
    generator: CodeGenerator,
    code_ttl: Option<Duration>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(CodeGenerator::default(), None)
    }
}

impl Registry {
    /// Creates an empty registry. `code_ttl` of `None` means codes live until
    /// they are redeemed or their host disconnects.
    pub fn new(generator: CodeGenerator, code_ttl: Option<Duration>) -> Self {
        Self {
            inner: Mutex::new(RegistryInner::default()),
            next_id: AtomicU64::new(0),
            generator,
            code_ttl,
        }
    }

    /// Allocates a fresh connection id. Ids start at 1 and are never reused.
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Opens a transaction: exclusive access to the registry until the returned
    /// guard is dropped.
    pub fn lock(&self) -> RegistryTxn<'_> {
        RegistryTxn {
            inner: self.inner.lock(),
            registry: self,
        }
    }

    pub fn register(
        &self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: PeerSender,
    ) -> Result<(), UniclipError> {
        self.lock().register(id, addr, sender)
    }

    pub fn get(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.lock().get(id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().contains(id)
    }

    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.lock().partner_of(id)
    }

    pub fn bind(&self, id_a: ConnectionId, id_b: ConnectionId) -> Result<(), UniclipError> {
        self.lock().bind(id_a, id_b)
    }

    pub fn unbind_one(&self, id: ConnectionId) -> bool {
        self.lock().unbind_one(id)
    }

    pub fn remove(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.lock().remove(id)
    }

    pub fn issue_code(&self, host_id: ConnectionId) -> Result<String, UniclipError> {
        self.lock().issue_code(host_id)
    }

    pub fn redeem_code(&self, code: &str) -> Option<ConnectionId> {
        self.lock().redeem_code(code)
    }

    pub fn release_code_for(&self, host_id: ConnectionId) -> usize {
        self.lock().release_code_for(host_id)
    }

    pub fn deliver(&self, id: ConnectionId, message: ServerMessage) -> Delivery {
        self.lock().deliver(id, message)
    }

    pub fn codes_held_by(&self, host_id: ConnectionId) -> Vec<String> {
        self.lock().codes_held_by(host_id)
    }

    /// Returns true if `code` is currently outstanding.
    pub fn has_code(&self, code: &str) -> bool {
        self.lock().inner.codes.contains_key(code)
    }

    /// Removes every code older than the configured TTL. Returns how many went.
    pub fn sweep_expired_codes(&self, now: Instant) -> usize {
        let Some(ttl) = self.code_ttl else {
            return 0;
        };
        let mut txn = self.lock();
        let expired: Vec<String> = txn
            .inner
            .codes
            .iter()
            .filter(|(_, issued)| now.saturating_duration_since(issued.issued_at) >= ttl)
            .map(|(code, _)| code.clone())
            .collect();
        for code in &expired {
            txn.take_code(code);
        }
        txn.refresh_code_gauge();
        metrics::CODES_EXPIRED_TOTAL.inc_by(expired.len() as f64);
        expired.len()
    }

    pub fn code_ttl(&self) -> Option<Duration> {
        self.code_ttl
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.lock().inner.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bound pairs.
    pub fn room_count(&self) -> usize {
        self.lock().room_count()
    }

    pub fn outstanding_codes(&self) -> usize {
        self.lock().inner.codes.len()
    }

    /// Snapshot of every registered connection, ordered by id.
    pub fn snapshot(&self) -> Vec<ConnectionInfo> {
        let txn = self.lock();
        let mut all: Vec<ConnectionInfo> = txn
            .inner
            .connections
            .iter()
            .map(|(id, entry)| info_of(*id, entry))
            .collect();
        all.sort_by_key(|c| c.id);
        all
    }
}

fn info_of(id: ConnectionId, entry: &ConnectionEntry) -> ConnectionInfo {
    ConnectionInfo {
        id,
        addr: entry.addr,
        partner_id: entry.partner_id,
        connected_at: entry.connected_at,
    }
}

/// Exclusive access to the registry for the lifetime of the guard.
pub struct RegistryTxn<'a> {
    inner: MutexGuard<'a, RegistryInner>,
    registry: &'a Registry,
}

impl RegistryTxn<'_> {
    /// Inserts a new, unpaired connection.
    pub fn register(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: PeerSender,
    ) -> Result<(), UniclipError> {
        if self.inner.connections.contains_key(&id) {
            return Err(UniclipError::DuplicateConnection(id));
        }
        self.inner.connections.insert(
            id,
            ConnectionEntry {
                sender,
                addr,
                partner_id: None,
                connected_at: Instant::now(),
            },
        );
        metrics::CONNECTED_CLIENTS.set(self.inner.connections.len() as f64);
        Ok(())
    }

    pub fn get(&self, id: ConnectionId) -> Option<ConnectionInfo> {
        self.inner
            .connections
            .get(&id)
            .map(|entry| info_of(id, entry))
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.connections.contains_key(&id)
    }

    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.inner.connections.get(&id).and_then(|e| e.partner_id)
    }

    /// Binds two registered, unpaired connections to each other. All or nothing.
    pub fn bind(&mut self, id_a: ConnectionId, id_b: ConnectionId) -> Result<(), UniclipError> {
        let unpaired = |id: &ConnectionId| {
            self.inner
                .connections
                .get(id)
                .is_some_and(|e| e.partner_id.is_none())
        };
        if id_a == id_b || !unpaired(&id_a) || !unpaired(&id_b) {
            return Err(UniclipError::BindRejected(id_a, id_b));
        }
        for (me, other) in [(id_a, id_b), (id_b, id_a)] {
            if let Some(entry) = self.inner.connections.get_mut(&me) {
                entry.partner_id = Some(other);
            }
        }
        self.inner.rooms += 1;
        metrics::ACTIVE_ROOMS.set(self.inner.rooms as f64);
        Ok(())
    }

    /// Clears `id`'s partner without touching the partner's record.
    /// Returns false if `id` is not registered.
    pub fn unbind_one(&mut self, id: ConnectionId) -> bool {
        let Some(partner) = self.inner.connections.get(&id).map(|e| e.partner_id) else {
            return false;
        };
        if let Some(partner) = partner {
            self.release_room(id, partner);
        }
        if let Some(entry) = self.inner.connections.get_mut(&id) {
            entry.partner_id = None;
        }
        true
    }

    /// Deletes the connection and returns its last state. Idempotent.
    pub fn remove(&mut self, id: ConnectionId) -> Option<ConnectionInfo> {
        let entry = self.inner.connections.remove(&id)?;
        if let Some(partner) = entry.partner_id {
            self.release_room(id, partner);
        }
        metrics::CONNECTED_CLIENTS.set(self.inner.connections.len() as f64);
        Some(info_of(id, &entry))
    }

    /// Generates a code that is not currently outstanding and records it
    /// against `host_id`. Codes already held by the host stay live.
    pub fn issue_code(&mut self, host_id: ConnectionId) -> Result<String, UniclipError> {
        if !self.contains(host_id) {
            return Err(UniclipError::UnknownConnection(host_id));
        }
        let code = {
            let codes = &self.inner.codes;
            self.registry
                .generator
                .generate_unique(|candidate| codes.contains_key(candidate))?
        };
        self.inner.codes.insert(
            code.clone(),
            IssuedCode {
                host_id,
                issued_at: Instant::now(),
            },
        );
        self.inner
            .codes_by_host
            .entry(host_id)
            .or_default()
            .insert(code.clone());
        metrics::CODES_ISSUED_TOTAL.inc();
        self.refresh_code_gauge();
        Ok(code)
    }

    /// Looks up and removes `code` in one step. The code is consumed even if
    /// the caller then fails to pair. An expired code is removed and treated as unknown.
    pub fn redeem_code(&mut self, code: &str) -> Option<ConnectionId> {
        let issued = self.take_code(code)?;
        self.refresh_code_gauge();
        if let Some(ttl) = self.registry.code_ttl
            && issued.issued_at.elapsed() >= ttl
        {
            debug!("Pairing code redeemed after its TTL; treating it as expired.");
            metrics::CODES_EXPIRED_TOTAL.inc();
            return None;
        }
        Some(issued.host_id)
    }

    /// Removes every unredeemed code issued by `host_id`. Returns how many.
    pub fn release_code_for(&mut self, host_id: ConnectionId) -> usize {
        let Some(codes) = self.inner.codes_by_host.remove(&host_id) else {
            return 0;
        };
        for code in &codes {
            self.inner.codes.remove(code);
        }
        self.refresh_code_gauge();
        codes.len()
    }

    pub fn codes_held_by(&self, host_id: ConnectionId) -> Vec<String> {
        let mut codes: Vec<String> = self
            .inner
            .codes_by_host
            .get(&host_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        codes.sort();
        codes
    }

    /// Puts `message` on `id`'s outbound queue without waiting. Only payloads
    /// can be refused for lack of room.
    pub fn deliver(&self, id: ConnectionId, message: ServerMessage) -> Delivery {
        let Some(entry) = self.inner.connections.get(&id) else {
            return Delivery::Closed;
        };
        let delivery = entry.sender.try_send(message);
        match delivery {
            Delivery::Queued => {}
            Delivery::QueueFull => {
                warn!("Outbound queue for connection {} is full; dropping payload.", id)
            }
            Delivery::Closed => debug!("Outbound queue for connection {} is closed.", id),
        }
        delivery
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms
    }

    /// Decrements the room count if `id` and `partner` were mutually bound.
    fn release_room(&mut self, id: ConnectionId, partner: ConnectionId) {
        if self.partner_of(partner) == Some(id) {
            self.inner.rooms = self.inner.rooms.saturating_sub(1);
            metrics::ACTIVE_ROOMS.set(self.inner.rooms as f64);
        }
    }

    fn take_code(&mut self, code: &str) -> Option<IssuedCode> {
        let issued = self.inner.codes.remove(code)?;
        if let Some(held) = self.inner.codes_by_host.get_mut(&issued.host_id) {
            held.remove(code);
            if held.is_empty() {
                self.inner.codes_by_host.remove(&issued.host_id);
            }
        }
        Some(issued)
    }

    fn refresh_code_gauge(&self) {
        metrics::OUTSTANDING_CODES.set(self.inner.codes.len() as f64);
    }
}
