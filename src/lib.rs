//! # match-relay
//!
//! WebSocket signaling relay for two-player remote chess matches.
//!
//! Two browser clients that know the same match identifier join the same
//! room, run a short handshake (connection request, acceptance), then
//! exchange opaque move events. The relay never looks inside game
//! payloads; it only groups connections by match and forwards each event
//! to the other member of the room.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket /ws, HTTP)
//!     │
//!     ├── WS Handler (ws/)          REST Handlers (api/)
//!     │
//!     ├── RelayService (service/)   relay, handshake, expiry sweep
//!     │
//!     ├── ConnectionRegistry (domain/)   connection → rooms
//!     └── RoomDirectory (domain/)        match → members, handshake state
//! ```
//!
//! All state is in memory and lost on restart.

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;
