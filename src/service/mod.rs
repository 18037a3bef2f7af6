//! Service layer: orchestrates the connection registry and room directory.
//!
//! [`RelayService`] is the single entry point used by the WebSocket layer
//! for joins, leaves, relayed events and disconnect cleanup.

pub mod relay_service;

pub use relay_service::{Dispatch, RelayService, RelayStats};
