//! Live connection bookkeeping.
//!
//! [`ConnectionRegistry`] owns every accepted connection: its outbound
//! queue and the reverse index of rooms it has joined, so that disconnect
//! cleanup never has to scan the whole [`super::RoomDirectory`].

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::{ConnectionId, MatchId, Outbound};

/// Sending half of a connection's outbound queue.
pub type OutboundSender = mpsc::Sender<Outbound>;

/// Receiving half of a connection's outbound queue, drained by the
/// connection's WebSocket write loop.
pub type OutboundReceiver = mpsc::Receiver<Outbound>;

/// State kept for one live connection.
#[derive(Debug)]
pub struct ConnectionEntry {
    /// Connection identifier.
    pub id: ConnectionId,
    /// Queue into the connection's write loop.
    pub sender: OutboundSender,
    /// Rooms this connection has joined.
    pub rooms: HashSet<MatchId>,
    /// When the transport was accepted.
    pub connected_at: DateTime<Utc>,
}

/// Registry of live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionEntry>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a newly accepted transport and assigns it a fresh id.
    pub fn register(&mut self, sender: OutboundSender) -> ConnectionId {
        let id = ConnectionId::new();
        self.connections.insert(
            id,
            ConnectionEntry {
                id,
                sender,
                rooms: HashSet::new(),
                connected_at: Utc::now(),
            },
        );
        id
    }

    /// Removes a connection, returning its entry (including the rooms it
    /// still belongs to). Returns `None` if it was already gone.
    pub fn unregister(&mut self, id: ConnectionId) -> Option<ConnectionEntry> {
        self.connections.remove(&id)
    }

    /// Notes that `id` joined `match_id`. Returns `false` for unknown ids.
    pub fn track_join(&mut self, id: ConnectionId, match_id: &MatchId) -> bool {
        let Some(entry) = self.connections.get_mut(&id) else {
            return false;
        };
        entry.rooms.insert(match_id.clone());
        true
    }

    /// Notes that `id` left `match_id`.
    pub fn track_leave(&mut self, id: ConnectionId, match_id: &MatchId) {
        if let Some(entry) = self.connections.get_mut(&id) {
            entry.rooms.remove(match_id);
        }
    }

    /// Returns the outbound queue for `id`.
    #[must_use]
    pub fn sender(&self, id: ConnectionId) -> Option<&OutboundSender> {
        self.connections.get(&id).map(|entry| &entry.sender)
    }

    /// Returns `true` if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns `true` if no connection is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
