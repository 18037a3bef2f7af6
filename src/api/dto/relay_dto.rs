//! Relay introspection DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::HandshakeState;
use crate::domain::room_directory::Room;
use crate::service::RelayStats;

/// Public view of a match room.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomResponse {
    /// Match identifier.
    pub match_id: String,
    /// Handshake state.
    pub state: HandshakeState,
    /// Number of connections in the room (at most 2).
    pub members: usize,
    /// Whether a connection request is waiting for acceptance.
    pub pending_request: bool,
    /// When the first member joined.
    pub created_at: DateTime<Utc>,
}

impl From<&Room> for RoomResponse {
    fn from(room: &Room) -> Self {
        Self {
            match_id: room.match_id.to_string(),
            state: room.state,
            members: room.members.len(),
            pending_request: room.pending_request.is_some(),
            created_at: room.created_at,
        }
    }
}

/// Live connection and room counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RelayStatsResponse {
    /// Live WebSocket connections.
    pub connections: usize,
    /// Live match rooms.
    pub rooms: usize,
}

impl From<RelayStats> for RelayStatsResponse {
    fn from(stats: RelayStats) -> Self {
        Self {
            connections: stats.connections,
            rooms: stats.rooms,
        }
    }
}
