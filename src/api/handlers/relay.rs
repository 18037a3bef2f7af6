//! Relay introspection handlers: counters and room lookup.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{RelayStatsResponse, RoomResponse};
use crate::app_state::AppState;
use crate::domain::MatchId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /relay/stats` — Live connection and room counts.
#[utoipa::path(
    get,
    path = "/api/v1/relay/stats",
    tag = "Relay",
    summary = "Relay counters",
    description = "Returns the number of live WebSocket connections and match rooms.",
    responses(
        (status = 200, description = "Current counters", body = RelayStatsResponse),
    )
)]
pub async fn relay_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(RelayStatsResponse::from(state.relay.stats().await))
}

/// `GET /relay/rooms/{match_id}` — Room state for a match.
///
/// # Errors
///
/// Returns [`RelayError::InvalidMatchId`] for a malformed id and
/// [`RelayError::RoomNotFound`] when nobody is in the room.
#[utoipa::path(
    get,
    path = "/api/v1/relay/rooms/{match_id}",
    tag = "Relay",
    summary = "Get match room",
    description = "Returns the handshake state and member count of a live match room.",
    params(
        ("match_id" = String, Path, description = "Match identifier"),
    ),
    responses(
        (status = 200, description = "Room found", body = RoomResponse),
        (status = 400, description = "Invalid match identifier", body = ErrorResponse),
        (status = 404, description = "No live room for this match", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let match_id = MatchId::parse(raw)?;
    let room = state
        .relay
        .room(&match_id)
        .await
        .ok_or_else(|| RelayError::RoomNotFound(match_id.clone()))?;
    Ok(Json(RoomResponse::from(&room)))
}

/// Relay routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/relay/stats", get(relay_stats))
        .route("/relay/rooms/{match_id}", get(get_room))
}
