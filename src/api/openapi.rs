//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use super::handlers::{relay, system};

/// OpenAPI description of the REST endpoints, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "match-relay",
        description = "Signaling relay pairing the two players of a remote chess match."
    ),
    paths(
        system::health_handler,
        relay::relay_stats,
        relay::get_room,
    ),
    tags(
        (name = "System", description = "Service health"),
        (name = "Relay", description = "Live room and connection introspection"),
    )
)]
pub struct ApiDoc;
