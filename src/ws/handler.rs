//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::HeaderMap;
use axum::http::header::ORIGIN;
use axum::response::{IntoResponse, Response};

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::error::RelayError;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Browsers always send `Origin`; it must be in the configured allow-list
/// (403 otherwise). Requests without the header (native clients) are
/// accepted. The origin is checked before the upgrade headers.
pub async fn ws_handler(
    headers: HeaderMap,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if let Some(origin) = headers.get(ORIGIN) {
        let origin = origin.to_str().unwrap_or_default();
        if !state.config.is_origin_allowed(origin) {
            tracing::warn!(origin, "ws upgrade rejected");
            return RelayError::OriginNotAllowed(origin.to_string()).into_response();
        }
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let relay = Arc::clone(&state.relay);
    ws.max_message_size(state.config.max_frame_bytes)
        .on_upgrade(move |socket| run_connection(socket, relay))
}
