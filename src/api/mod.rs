//! HTTP boundary: route handlers, DTOs, router and CORS composition.
//!
//! REST endpoints are mounted under `/api/v1`, the WebSocket endpoint at
//! `/ws`. Every unmatched path answers 404 `this <path> route not defined`.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::RelayConfig;
use crate::ws::handler::ws_handler;

/// Builds the complete router: REST endpoints, `/ws`, and the 404 fallback.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .route("/ws", get(ws_handler))
        .fallback(handlers::system::route_not_found)
}

/// CORS policy restricted to the configured origins.
///
/// Origins that are not valid header values are skipped.
pub fn cors_layer(config: &RelayConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

/// Builds the fully layered application for the given state.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let router = build_router();

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::domain::MatchId;

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let Ok(request) = Request::builder().uri(uri).body(Body::empty()) else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_path() {
        let app = build_app(AppState::new(RelayConfig::default()));
        let (status, body) = get_json(app, "/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({
                "status": "fail",
                "error": {"code": 2001, "message": "this /unknown route not defined"}
            })
        );
    }

    #[tokio::test]
    async fn unknown_route_keeps_query_string() {
        let app = build_app(AppState::new(RelayConfig::default()));
        let (_, body) = get_json(app, "/api/v1/match/nope?x=1").await;
        assert_eq!(
            body.pointer("/error/message"),
            Some(&json!("this /api/v1/match/nope?x=1 route not defined"))
        );
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let app = build_app(AppState::new(RelayConfig::default()));
        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("status"), Some(&json!("healthy")));
    }

    #[tokio::test]
    async fn room_lookup_reflects_relay_state() {
        let state = AppState::new(RelayConfig::default());
        let app = build_app(state.clone());

        let (status, _) = get_json(app.clone(), "/api/v1/relay/rooms/M1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (conn, _rx) = state.relay.connect().await;
        let Ok(match_id) = MatchId::parse("M1") else {
            panic!("valid match id");
        };
        let _ = state.relay.join(conn, match_id).await;

        let (status, body) = get_json(app.clone(), "/api/v1/relay/rooms/M1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("members"), Some(&json!(1)));
        assert_eq!(body.get("state"), Some(&json!("awaiting_peer")));

        let (_, stats) = get_json(app, "/api/v1/relay/stats").await;
        assert_eq!(stats, json!({"connections": 1, "rooms": 1}));
    }

    #[tokio::test]
    async fn cors_allows_listed_origin_only() {
        let app = build_app(AppState::new(RelayConfig::default()));
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/health")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
        };

        let Ok(request) = preflight("http://localhost:3000") else {
            panic!("valid request");
        };
        let Ok(response) = app.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );

        let Ok(request) = preflight("https://elsewhere.test") else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn ws_upgrade_rejects_foreign_origin() {
        let app = build_app(AppState::new(RelayConfig::default()));
        let Ok(request) = Request::builder()
            .uri("/ws")
            .header(header::ORIGIN, "https://elsewhere.test")
            .header(header::CONNECTION, "upgrade")
            .header(header::UPGRADE, "websocket")
            .header(header::SEC_WEBSOCKET_VERSION, "13")
            .header(header::SEC_WEBSOCKET_KEY, "dGhlIHNhbXBsZSBub25jZQ==")
            .body(Body::empty())
        else {
            panic!("valid request");
        };
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
