//! Relay service: joins, leaves, event forwarding and handshake expiry.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::config::RelayConfig;
use crate::domain::room_directory::Room;
use crate::domain::{
    ConnectionId, ConnectionRegistry, HandshakeState, MatchId, Outbound, OutboundReceiver,
    OutboundSender, RelayEvent, RoomDirectory, ServerNotice,
};
use crate::error::RelayError;

/// Outcome of one dispatched client event, used to build the sender's
/// acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Wire name of the handled event.
    pub event: &'static str,
    /// Room the event addressed.
    pub match_id: MatchId,
    /// Room state after handling.
    pub state: HandshakeState,
    /// Number of connections the event (or notice) was queued for.
    pub delivered: usize,
}

/// Point-in-time counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    /// Live connections.
    pub connections: usize,
    /// Live rooms.
    pub rooms: usize,
}

/// Registry and directory, mutated together under one lock so the
/// reverse index never disagrees with room membership.
#[derive(Debug, Default)]
struct RelayState {
    connections: ConnectionRegistry,
    rooms: RoomDirectory,
}

impl RelayState {
    fn ensure_registered(&self, id: ConnectionId) -> Result<(), RelayError> {
        if self.connections.contains(id) {
            Ok(())
        } else {
            Err(RelayError::UnknownConnection(id))
        }
    }

    /// Resolves outbound queues for `ids`, skipping connections that are gone.
    fn senders(&self, ids: &[ConnectionId]) -> Vec<(ConnectionId, OutboundSender)> {
        ids.iter()
            .filter_map(|id| self.connections.sender(*id).map(|tx| (*id, tx.clone())))
            .collect()
    }
}

/// Coordinates the connection registry and room directory.
///
/// Created once at startup and shared as `Arc<RelayService>` through the
/// Axum state. All mutation happens under a single async mutex; member sets
/// are snapshotted under the lock and delivery happens after it is
/// released, so a slow consumer never blocks other rooms.
///
/// Events from one connection are dispatched in the order its read loop
/// hands them over, which keeps per-sender FIFO ordering.
#[derive(Debug)]
pub struct RelayService {
    state: Mutex<RelayState>,
    outbound_capacity: usize,
    handshake_timeout: Option<Duration>,
}

impl RelayService {
    /// Creates a relay with the given per-connection queue capacity and
    /// optional handshake timeout.
    #[must_use]
    pub fn new(outbound_capacity: usize, handshake_timeout: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(RelayState::default()),
            outbound_capacity: outbound_capacity.max(1),
            handshake_timeout,
        }
    }

    /// Creates a relay from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.outbound_queue_capacity, config.handshake_timeout())
    }

    /// Registers a freshly accepted transport.
    ///
    /// Returns the assigned id and the queue the connection's write loop
    /// must drain.
    pub async fn connect(&self) -> (ConnectionId, OutboundReceiver) {
        let (tx, rx) = mpsc::channel(self.outbound_capacity);
        let id = self.state.lock().await.connections.register(tx);
        tracing::info!(connection = %id, "connection registered");
        (id, rx)
    }

    /// Removes a connection from every room it belongs to and forgets it.
    ///
    /// Remaining room members receive a `peer-left` notice. Returns the
    /// number of rooms the connection was removed from.
    pub async fn disconnect(&self, id: ConnectionId) -> usize {
        let mut deliveries = Vec::new();
        let rooms_left = {
            let mut state = self.state.lock().await;
            let Some(entry) = state.connections.unregister(id) else {
                return 0;
            };
            let mut rooms_left = 0;
            for match_id in entry.rooms {
                let Some(outcome) = state.rooms.leave(&match_id, id) else {
                    continue;
                };
                rooms_left += 1;
                let notice = Outbound::Notice(ServerNotice::PeerLeft {
                    match_id,
                    state: outcome.state,
                });
                for (peer, tx) in state.senders(&outcome.remaining) {
                    deliveries.push((peer, tx, notice.clone()));
                }
            }
            rooms_left
        };

        let _ = deliver(deliveries);
        tracing::info!(connection = %id, rooms_left, "connection unregistered");
        rooms_left
    }

    /// Handles one client event from `from`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomFull`] for a join on a full room,
    /// [`RelayError::NotAMember`] for leaving a room the connection is not
    /// in, and [`RelayError::UnknownConnection`] if `from` is not registered.
    pub async fn dispatch(
        &self,
        from: ConnectionId,
        event: RelayEvent,
    ) -> Result<Dispatch, RelayError> {
        match event {
            RelayEvent::JoinMatch { match_id } => self.join(from, match_id).await,
            RelayEvent::LeaveMatch { match_id } => self.leave(from, match_id).await,
            other => self.relay(from, other).await,
        }
    }

    /// Adds `from` to the room for `match_id`.
    ///
    /// Idempotent: joining again as a member succeeds without changing
    /// membership.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomFull`] if two other connections already
    /// hold the room, or [`RelayError::UnknownConnection`].
    pub async fn join(&self, from: ConnectionId, match_id: MatchId) -> Result<Dispatch, RelayError> {
        let outcome = {
            let mut state = self.state.lock().await;
            state.ensure_registered(from)?;
            let outcome = state.rooms.join(&match_id, from).inspect_err(|_| {
                tracing::warn!(connection = %from, %match_id, "join rejected, room full");
            })?;
            state.connections.track_join(from, &match_id);
            outcome
        };

        if outcome.newly_joined {
            tracing::info!(
                connection = %from,
                %match_id,
                members = outcome.members,
                "joined match room"
            );
        }
        Ok(Dispatch {
            event: "join-match",
            match_id,
            state: outcome.state,
            delivered: 0,
        })
    }

    /// Removes `from` from the room for `match_id` and notifies the peer.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::NotAMember`] if `from` is not in the room, or
    /// [`RelayError::UnknownConnection`].
    pub async fn leave(&self, from: ConnectionId, match_id: MatchId) -> Result<Dispatch, RelayError> {
        let (outcome, targets) = {
            let mut state = self.state.lock().await;
            state.ensure_registered(from)?;
            let outcome = state
                .rooms
                .leave(&match_id, from)
                .ok_or_else(|| RelayError::NotAMember(match_id.clone()))?;
            state.connections.track_leave(from, &match_id);
            let targets = state.senders(&outcome.remaining);
            (outcome, targets)
        };

        let notice = Outbound::Notice(ServerNotice::PeerLeft {
            match_id: match_id.clone(),
            state: outcome.state,
        });
        let delivered = deliver(
            targets
                .into_iter()
                .map(|(peer, tx)| (peer, tx, notice.clone())),
        );
        tracing::info!(connection = %from, %match_id, "left match room");
        Ok(Dispatch {
            event: "leave-match",
            match_id,
            state: outcome.state,
            delivered,
        })
    }

    /// Forwards a relayed event to every other member of its room.
    ///
    /// The sender does not need to be a member. An empty or unknown room
    /// is a silent no-op reported as `delivered: 0`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownConnection`] if `from` is not registered.
    pub async fn relay(&self, from: ConnectionId, event: RelayEvent) -> Result<Dispatch, RelayError> {
        let match_id = event.match_id().clone();
        let name = event.name();

        let (targets, room_state) = {
            let mut state = self.state.lock().await;
            state.ensure_registered(from)?;
            match &event {
                RelayEvent::ConnectionReqFromPlayer { .. } => {
                    state.rooms.record_request(&match_id, from, Instant::now());
                }
                RelayEvent::ConnectionReqAccepted { .. } => {
                    let _ = state.rooms.record_accept(&match_id, from);
                }
                _ => {}
            }
            let peers = state.rooms.members_excluding(&match_id, from);
            (state.senders(&peers), state.rooms.state(&match_id))
        };

        let outbound = Outbound::Relayed(event);
        let delivered = deliver(
            targets
                .into_iter()
                .map(|(peer, tx)| (peer, tx, outbound.clone())),
        );
        if delivered == 0 {
            tracing::debug!(connection = %from, %match_id, event = name, "no peer in room, event dropped");
        } else {
            tracing::debug!(connection = %from, %match_id, event = name, delivered, "event relayed");
        }

        Ok(Dispatch {
            event: name,
            match_id,
            state: room_state,
            delivered,
        })
    }

    /// Expires connection requests older than the handshake timeout.
    ///
    /// Each requester is removed from the room, receives a
    /// `handshake-expired` notice, and the remaining member (if any) gets
    /// `peer-left`. Returns the number of expired requests. Always `0` when
    /// the timeout is disabled.
    pub async fn expire_pending(&self, now: Instant) -> usize {
        let Some(timeout) = self.handshake_timeout else {
            return 0;
        };

        let (expired, deliveries) = {
            let mut state = self.state.lock().await;
            let expired = state.rooms.expire_requests(now, timeout);
            let mut deliveries = Vec::with_capacity(expired.len() * 2);
            for request in &expired {
                state
                    .connections
                    .track_leave(request.requester, &request.match_id);
                if let Some(tx) = state.connections.sender(request.requester) {
                    deliveries.push((
                        request.requester,
                        tx.clone(),
                        Outbound::Notice(ServerNotice::HandshakeExpired {
                            match_id: request.match_id.clone(),
                        }),
                    ));
                }
                let notice = Outbound::Notice(ServerNotice::PeerLeft {
                    match_id: request.match_id.clone(),
                    state: request.left.state,
                });
                for (peer, tx) in state.senders(&request.left.remaining) {
                    deliveries.push((peer, tx, notice.clone()));
                }
            }
            (expired, deliveries)
        };

        for request in &expired {
            tracing::info!(
                connection = %request.requester,
                match_id = %request.match_id,
                "connection request expired"
            );
        }
        let _ = deliver(deliveries);
        expired.len()
    }

    /// Spawns the periodic handshake expiry sweep.
    ///
    /// Returns `None` when the handshake timeout is disabled. The caller
    /// aborts the returned handle at shutdown.
    #[must_use]
    pub fn spawn_handshake_sweeper(self: &Arc<Self>, period: Duration) -> Option<JoinHandle<()>> {
        if self.handshake_timeout.is_none() {
            return None;
        }
        let relay = Arc::clone(self);
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(10)));
            loop {
                ticker.tick().await;
                let _ = relay.expire_pending(Instant::now()).await;
            }
        }))
    }

    /// Returns a copy of the room for `match_id`, if it exists.
    pub async fn room(&self, match_id: &MatchId) -> Option<Room> {
        self.state.lock().await.rooms.get(match_id).cloned()
    }

    /// Returns current connection and room counts.
    pub async fn stats(&self) -> RelayStats {
        let state = self.state.lock().await;
        RelayStats {
            connections: state.connections.len(),
            rooms: state.rooms.len(),
        }
    }
}

/// Queues each outbound payload without waiting. Full queues drop the
/// payload. Returns the number of payloads queued.
fn deliver(deliveries: impl IntoIterator<Item = (ConnectionId, OutboundSender, Outbound)>) -> usize {
    let mut delivered = 0;
    for (to, tx, outbound) in deliveries {
        match tx.try_send(outbound) {
            Ok(()) => delivered += 1,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(connection = %to, "outbound queue full, dropping frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(connection = %to, "outbound queue closed");
            }
        }
    }
    delivered
}
