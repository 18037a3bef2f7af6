//! Match rooms keyed by [`MatchId`].
//!
//! A room is created implicitly by the first join and removed as soon as
//! its last member leaves. Each room holds at most [`ROOM_CAPACITY`]
//! connections and tracks where the two players are in the handshake.
//!
//! The directory is a plain data structure; callers serialize access (see
//! [`crate::service::RelayService`]).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::{ConnectionId, MatchId};
use crate::error::RelayError;

/// Maximum number of connections per room.
pub const ROOM_CAPACITY: usize = 2;

/// Handshake progress of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum HandshakeState {
    /// No members; the room does not exist in the directory.
    Empty,
    /// One or two members, no accepted connection request yet.
    AwaitingPeer,
    /// Both players are present and a connection request was accepted.
    Connected,
}

/// A connection request waiting for `connection-req-accepted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    /// Connection that sent the request.
    pub from: ConnectionId,
    /// When the request was relayed.
    pub at: Instant,
}

/// A single match room.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room key.
    pub match_id: MatchId,
    /// Members in join order.
    pub members: Vec<ConnectionId>,
    /// Current handshake state.
    pub state: HandshakeState,
    /// Outstanding connection request, if any.
    pub pending_request: Option<PendingRequest>,
    /// When the first member joined.
    pub created_at: DateTime<Utc>,
}

impl Room {
    fn new(match_id: MatchId) -> Self {
        Self {
            match_id,
            members: Vec::with_capacity(ROOM_CAPACITY),
            state: HandshakeState::AwaitingPeer,
            pending_request: None,
            created_at: Utc::now(),
        }
    }

    /// Returns `true` if the connection is a member of this room.
    #[must_use]
    pub fn contains(&self, conn: ConnectionId) -> bool {
        self.members.contains(&conn)
    }

    /// Returns `true` if no further connection can join.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= ROOM_CAPACITY
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// `false` when the connection was already a member.
    pub newly_joined: bool,
    /// Room state after the join.
    pub state: HandshakeState,
    /// Number of members after the join.
    pub members: usize,
}

/// Result of removing a connection from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// Members still in the room.
    pub remaining: Vec<ConnectionId>,
    /// Room state after the departure.
    pub state: HandshakeState,
}

/// A pending request that timed out. The requester has been removed from
/// the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredRequest {
    /// Room the request was sent to.
    pub match_id: MatchId,
    /// Connection that sent it.
    pub requester: ConnectionId,
    /// What is left of the room after the requester was removed.
    pub left: LeaveOutcome,
}

/// Map from match identifier to room.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<MatchId, Room>,
}

impl RoomDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `conn` to the room for `match_id`, creating the room if needed.
    ///
    /// Joining a room the connection is already in succeeds without
    /// changing membership.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::RoomFull`] if the room already holds
    /// [`ROOM_CAPACITY`] other connections.
    pub fn join(&mut self, match_id: &MatchId, conn: ConnectionId) -> Result<JoinOutcome, RelayError> {
        let room = self
            .rooms
            .entry(match_id.clone())
            .or_insert_with(|| Room::new(match_id.clone()));

        if room.contains(conn) {
            return Ok(JoinOutcome {
                newly_joined: false,
                state: room.state,
                members: room.members.len(),
            });
        }
        if room.is_full() {
            return Err(RelayError::RoomFull(match_id.clone()));
        }

        room.members.push(conn);
        Ok(JoinOutcome {
            newly_joined: true,
            state: room.state,
            members: room.members.len(),
        })
    }

    /// Removes `conn` from the room for `match_id`.
    ///
    /// The room is dropped from the directory once empty. Any remaining
    /// member falls back to [`HandshakeState::AwaitingPeer`].
    ///
    /// Returns `None` if the connection was not a member.
    pub fn leave(&mut self, match_id: &MatchId, conn: ConnectionId) -> Option<LeaveOutcome> {
        let room = self.rooms.get_mut(match_id)?;
        let before = room.members.len();
        room.members.retain(|m| *m != conn);
        if room.members.len() == before {
            return None;
        }

        if room.members.is_empty() {
            self.rooms.remove(match_id);
            return Some(LeaveOutcome {
                remaining: Vec::new(),
                state: HandshakeState::Empty,
            });
        }

        room.state = HandshakeState::AwaitingPeer;
        if room.pending_request.is_some_and(|p| p.from == conn) {
            room.pending_request = None;
        }
        Some(LeaveOutcome {
            remaining: room.members.clone(),
            state: room.state,
        })
    }

    /// Returns every member of the room except `conn`.
    ///
    /// The returned vector is a snapshot; it is safe to deliver to it after
    /// the directory has been released. Unknown rooms yield an empty set.
    #[must_use]
    pub fn members_excluding(&self, match_id: &MatchId, conn: ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(match_id)
            .map(|room| {
                room.members
                    .iter()
                    .copied()
                    .filter(|m| *m != conn)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Records a connection request so it can expire if never accepted.
    ///
    /// Ignored for unknown rooms, rooms that are already connected, and
    /// senders that are not members of the room.
    pub fn record_request(&mut self, match_id: &MatchId, from: ConnectionId, at: Instant) {
        if let Some(room) = self.rooms.get_mut(match_id)
            && room.state != HandshakeState::Connected
            && room.contains(from)
        {
            room.pending_request = Some(PendingRequest { from, at });
        }
    }

    /// Records an accepted connection request.
    ///
    /// The room becomes [`HandshakeState::Connected`] when the acceptor is a
    /// member and both seats are taken. Returns the resulting state.
    pub fn record_accept(&mut self, match_id: &MatchId, from: ConnectionId) -> HandshakeState {
        let Some(room) = self.rooms.get_mut(match_id) else {
            return HandshakeState::Empty;
        };
        if room.contains(from) && room.is_full() {
            room.state = HandshakeState::Connected;
            room.pending_request = None;
        }
        room.state
    }

    /// Expires pending requests older than `timeout`.
    ///
    /// Each requester loses its seat, exactly as if it had left the room.
    pub fn expire_requests(&mut self, now: Instant, timeout: Duration) -> Vec<ExpiredRequest> {
        let mut stale = Vec::new();
        for room in self.rooms.values_mut() {
            if let Some(pending) = room.pending_request
                && now.saturating_duration_since(pending.at) >= timeout
            {
                room.pending_request = None;
                stale.push((room.match_id.clone(), pending.from));
            }
        }

        let mut expired = Vec::with_capacity(stale.len());
        for (match_id, requester) in stale {
            if let Some(left) = self.leave(&match_id, requester) {
                expired.push(ExpiredRequest {
                    match_id,
                    requester,
                    left,
                });
            }
        }
        expired
    }

    /// Returns the handshake state for `match_id`.
    #[must_use]
    pub fn state(&self, match_id: &MatchId) -> HandshakeState {
        self.rooms
            .get(match_id)
            .map_or(HandshakeState::Empty, |room| room.state)
    }

    /// Returns the room for `match_id`, if it exists.
    #[must_use]
    pub fn get(&self, match_id: &MatchId) -> Option<&Room> {
        self.rooms.get(match_id)
    }

    /// Returns the number of live rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Returns `true` if there are no live rooms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn mid(raw: &str) -> MatchId {
        let Ok(id) = MatchId::parse(raw) else {
            panic!("valid match id");
        };
        id
    }

    #[test]
    fn first_join_creates_room() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let Ok(outcome) = dir.join(&mid("M1"), a) else {
            panic!("join failed");
        };
        assert!(outcome.newly_joined);
        assert_eq!(outcome.members, 1);
        assert_eq!(outcome.state, HandshakeState::AwaitingPeer);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn join_is_idempotent() {
        let mut dir = RoomDirectory::new();
        let a = ConnectionId::new();
        let _ = dir.join(&mid("M1"), a);
        let Ok(again) = dir.join(&mid("M1"), a) else {
            panic!("rejoin failed");
        };
        assert!(!again.newly_joined);
        assert_eq!(again.members, 1);
    }

    #[test]
    fn third_joiner_is_rejected() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        assert!(dir.join(&m, ConnectionId::new()).is_ok());
        assert!(dir.join(&m, ConnectionId::new()).is_ok());
        let result = dir.join(&m, ConnectionId::new());
        assert_eq!(result, Err(RelayError::RoomFull(m.clone())));
        assert_eq!(dir.get(&m).map(|r| r.members.len()), Some(2));
    }

    #[test]
    fn members_excluding_omits_sender() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _ = dir.join(&m, a);
        let _ = dir.join(&m, b);
        assert_eq!(dir.members_excluding(&m, a), vec![b]);
        assert_eq!(dir.members_excluding(&m, b), vec![a]);
        assert!(dir.members_excluding(&mid("nope"), a).is_empty());
    }

    #[test]
    fn accept_with_both_members_connects() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _ = dir.join(&m, a);
        assert_eq!(dir.record_accept(&m, a), HandshakeState::AwaitingPeer);

        let _ = dir.join(&m, b);
        dir.record_request(&m, a, Instant::now());
        assert_eq!(dir.record_accept(&m, b), HandshakeState::Connected);
        assert!(dir.get(&m).is_some_and(|r| r.pending_request.is_none()));
    }

    #[test]
    fn accept_from_outsider_does_not_connect() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let _ = dir.join(&m, ConnectionId::new());
        let _ = dir.join(&m, ConnectionId::new());
        assert_eq!(
            dir.record_accept(&m, ConnectionId::new()),
            HandshakeState::AwaitingPeer
        );
        assert_eq!(dir.record_accept(&mid("other"), ConnectionId::new()), HandshakeState::Empty);
    }

    #[test]
    fn leave_drops_empty_room() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let a = ConnectionId::new();
        let _ = dir.join(&m, a);
        let Some(outcome) = dir.leave(&m, a) else {
            panic!("member should leave");
        };
        assert!(outcome.remaining.is_empty());
        assert_eq!(outcome.state, HandshakeState::Empty);
        assert!(dir.is_empty());
        assert!(dir.leave(&m, a).is_none());
    }

    #[test]
    fn leave_resets_connected_room() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _ = dir.join(&m, a);
        let _ = dir.join(&m, b);
        let _ = dir.record_accept(&m, b);

        let Some(outcome) = dir.leave(&m, b) else {
            panic!("member should leave");
        };
        assert_eq!(outcome.remaining, vec![a]);
        assert_eq!(outcome.state, HandshakeState::AwaitingPeer);

        // Freed seat can be taken again.
        assert!(dir.join(&m, ConnectionId::new()).is_ok());
    }

    #[test]
    fn request_ignored_once_connected() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _ = dir.join(&m, a);
        let _ = dir.join(&m, b);
        let _ = dir.record_accept(&m, b);
        dir.record_request(&m, a, Instant::now());
        assert!(dir.get(&m).is_some_and(|r| r.pending_request.is_none()));
    }

    #[test]
    fn stale_requests_expire_once() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let a = ConnectionId::new();
        let _ = dir.join(&m, a);
        let sent = Instant::now();
        dir.record_request(&m, a, sent);

        let timeout = Duration::from_secs(30);
        assert!(dir.expire_requests(sent, timeout).is_empty());

        let later = sent + Duration::from_secs(31);
        let expired = dir.expire_requests(later, timeout);
        assert_eq!(
            expired,
            vec![ExpiredRequest {
                match_id: m.clone(),
                requester: a,
                left: LeaveOutcome {
                    remaining: Vec::new(),
                    state: HandshakeState::Empty,
                },
            }]
        );
        assert!(dir.is_empty());
        assert!(dir.expire_requests(later, timeout).is_empty());
    }

    #[test]
    fn expired_request_frees_the_seat() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let (a, b) = (ConnectionId::new(), ConnectionId::new());
        let _ = dir.join(&m, a);
        let _ = dir.join(&m, b);
        let sent = Instant::now();
        dir.record_request(&m, a, sent);

        let expired = dir.expire_requests(sent + Duration::from_secs(31), Duration::from_secs(30));
        let Some(request) = expired.first() else {
            panic!("request should expire");
        };
        assert_eq!(request.requester, a);
        assert_eq!(request.left.remaining, vec![b]);
        assert_eq!(request.left.state, HandshakeState::AwaitingPeer);

        assert_eq!(dir.get(&m).map(|r| r.members.clone()), Some(vec![b]));
        assert!(dir.join(&m, ConnectionId::new()).is_ok());
    }

    #[test]
    fn request_from_outsider_is_not_recorded() {
        let mut dir = RoomDirectory::new();
        let m = mid("M1");
        let _ = dir.join(&m, ConnectionId::new());
        dir.record_request(&m, ConnectionId::new(), Instant::now());
        assert!(dir.get(&m).is_some_and(|r| r.pending_request.is_none()));
    }

    #[test]
    fn state_of_unknown_room_is_empty() {
        let dir = RoomDirectory::new();
        assert_eq!(dir.state(&mid("M9")), HandshakeState::Empty);
    }
}
