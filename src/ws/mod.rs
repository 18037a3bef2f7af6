//! WebSocket layer: upgrade handling, per-connection loop, frame codec.
//!
//! The WebSocket endpoint at `/ws` carries the named match events between
//! the two players of a room.

pub mod connection;
pub mod handler;
pub mod messages;
