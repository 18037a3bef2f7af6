//! Named events exchanged between the two players of a match.
//!
//! [`RelayEvent`] is what clients send; the wire names are fixed strings
//! that browser clients already emit. [`ServerNotice`] covers events the
//! relay originates itself. [`Outbound`] is anything queued for delivery
//! to one connection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::MatchId;
use super::room_directory::HandshakeState;

/// A named client event scoped to a match room.
///
/// Payload fields (`address`, `moveData`) are opaque JSON and are forwarded
/// structure-for-structure; the relay never inspects game content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum RelayEvent {
    /// "I would like to connect", forwarded to whoever is already in the room.
    ConnectionReqFromPlayer {
        /// Target room.
        match_id: MatchId,
        /// Requester's peer address.
        address: Value,
    },

    /// Acceptance of a pending connection request. Acknowledged to the
    /// sender once forwarded.
    ConnectionReqAccepted {
        /// Target room.
        match_id: MatchId,
        /// Accepting peer's address.
        address: Value,
    },

    /// A game move, forwarded verbatim.
    ChessPieceMoved {
        /// Target room.
        match_id: MatchId,
        /// Opaque move description.
        move_data: Value,
    },

    /// Join the room for this match. Not forwarded.
    JoinMatch {
        /// Room to join.
        match_id: MatchId,
    },

    /// Leave the room for this match. Not forwarded.
    LeaveMatch {
        /// Room to leave.
        match_id: MatchId,
    },
}

impl RelayEvent {
    /// Returns the room this event addresses.
    #[must_use]
    pub const fn match_id(&self) -> &MatchId {
        match self {
            Self::ConnectionReqFromPlayer { match_id, .. }
            | Self::ConnectionReqAccepted { match_id, .. }
            | Self::ChessPieceMoved { match_id, .. }
            | Self::JoinMatch { match_id }
            | Self::LeaveMatch { match_id } => match_id,
        }
    }

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ConnectionReqFromPlayer { .. } => "connection-req-from-player",
            Self::ConnectionReqAccepted { .. } => "connection-req-accepted",
            Self::ChessPieceMoved { .. } => "chess-piece-moved",
            Self::JoinMatch { .. } => "join-match",
            Self::LeaveMatch { .. } => "leave-match",
        }
    }

    /// Whether the sender always gets an acknowledgement, with or without
    /// a correlation id.
    #[must_use]
    pub const fn always_acked(&self) -> bool {
        matches!(
            self,
            Self::ConnectionReqAccepted { .. } | Self::JoinMatch { .. } | Self::LeaveMatch { .. }
        )
    }
}

/// Events the relay originates towards a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(
    tag = "event",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerNotice {
    /// The other player left the room or disconnected.
    PeerLeft {
        /// Room the peer left.
        match_id: MatchId,
        /// Room state after the departure.
        state: HandshakeState,
    },

    /// A connection request sent by this connection was not accepted in time.
    HandshakeExpired {
        /// Room the request was sent to.
        match_id: MatchId,
    },
}

/// A payload queued for delivery to a single connection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Outbound {
    /// A client event forwarded from the other room member.
    Relayed(RelayEvent),
    /// A notice generated by the relay.
    Notice(ServerNotice),
}
