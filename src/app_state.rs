//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::service::RelayService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Relay service owning all room and connection state.
    pub relay: Arc<RelayService>,
    /// Loaded configuration (origin allow-list, frame limits).
    pub config: Arc<RelayConfig>,
}

impl AppState {
    /// Builds the state from a configuration, creating a fresh relay.
    #[must_use]
    pub fn new(config: RelayConfig) -> Self {
        Self {
            relay: Arc::new(RelayService::from_config(&config)),
            config: Arc::new(config),
        }
    }
}
