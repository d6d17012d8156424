//! Server state — favorite engine plus per-connection principals.
//!
//! Owned exclusively by the server loop. No concurrent access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::favorite::{FavoriteEngine, Principal};

/// Unique identifier for a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

pub struct ServerState {
    engine: FavoriteEngine,
    /// Handshaken connections and the principal each one announced.
    /// `None` means anonymous.
    connections: HashMap<ConnectionId, Option<Principal>>,
}

impl ServerState {
    pub fn new(engine: FavoriteEngine) -> Self {
        Self {
            engine,
            connections: HashMap::new(),
        }
    }

    pub fn engine(&self) -> &FavoriteEngine {
        &self.engine
    }

    /// Register a handshaken connection.
    pub fn add_connection(&mut self, id: ConnectionId, principal: Option<Principal>) {
        self.connections.insert(id, principal);
    }

    pub fn remove_connection(&mut self, id: ConnectionId) {
        self.connections.remove(&id);
    }

    /// Whether the connection completed its handshake.
    pub fn is_connected(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Principal of a connection, or `None` for anonymous or unknown
    /// connections.
    pub fn principal(&self, id: ConnectionId) -> Option<&Principal> {
        self.connections.get(&id).and_then(Option::as_ref)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}
