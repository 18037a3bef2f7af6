//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type for the relay. Each variant
//! maps to a numeric code and an HTTP status. HTTP handlers return it as a
//! structured JSON body; the WebSocket layer sends the same code and
//! message back to the originating connection as an `error` frame.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ConnectionId, MatchId};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "status": "fail",
///   "error": {
///     "code": 2001,
///     "message": "this /unknown route not defined"
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Always `"fail"`: every relay error is a client error.
    pub status: String,
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`RelayError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
}

/// Relay error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request / 403        |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Match identifier failed validation.
    #[error("invalid match id: {0}")]
    InvalidMatchId(String),

    /// Inbound WebSocket frame could not be decoded.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The `Origin` header is not in the configured allow-list.
    #[error("origin not allowed: {0}")]
    OriginNotAllowed(String),

    /// No HTTP route matches the requested path.
    #[error("this {0} route not defined")]
    RouteNotFound(String),

    /// No room is currently registered for the match identifier.
    #[error("match room not found: {0}")]
    RoomNotFound(MatchId),

    /// The room already holds two other connections.
    #[error("match room {0} is full")]
    RoomFull(MatchId),

    /// The connection tried to leave a room it never joined.
    #[error("connection is not a member of match room {0}")]
    NotAMember(MatchId),

    /// The connection is not (or no longer) registered.
    #[error("unknown connection: {0}")]
    UnknownConnection(ConnectionId),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidMatchId(_) => 1001,
            Self::MalformedFrame(_) => 1002,
            Self::OriginNotAllowed(_) => 1003,
            Self::RouteNotFound(_) => 2001,
            Self::RoomNotFound(_) => 2002,
            Self::RoomFull(_) => 2003,
            Self::NotAMember(_) => 2004,
            Self::UnknownConnection(_) => 2005,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidMatchId(_) | Self::MalformedFrame(_) => StatusCode::BAD_REQUEST,
            Self::OriginNotAllowed(_) => StatusCode::FORBIDDEN,
            Self::RouteNotFound(_) | Self::RoomNotFound(_) | Self::UnknownConnection(_) => {
                StatusCode::NOT_FOUND
            }
            Self::RoomFull(_) | Self::NotAMember(_) => StatusCode::CONFLICT,
        }
    }

    /// Returns the code/message pair shared by HTTP and WebSocket errors.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.error_code(),
            message: self.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            status: "fail".to_string(),
            error: self.body(),
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
