//! Domain layer: identifiers, rooms, connections, and relay events.
//!
//! This module contains the in-memory model of the relay: the registry of
//! live connections, the directory of match rooms with their handshake
//! state, and the named events that flow between the two players.

pub mod connection_id;
pub mod connection_registry;
pub mod match_id;
pub mod relay_event;
pub mod room_directory;

pub use connection_id::ConnectionId;
pub use connection_registry::{ConnectionRegistry, OutboundReceiver, OutboundSender};
pub use match_id::MatchId;
pub use relay_event::{Outbound, RelayEvent, ServerNotice};
pub use room_directory::{HandshakeState, RoomDirectory};
