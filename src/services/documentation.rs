//! OpenAPI documentation generation.

use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the sportz backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::list_matches,
        crate::routes::matches::create_match,
        crate::routes::matches::get_match,
        crate::routes::matches::update_match,
        crate::routes::matches::update_score,
        crate::routes::commentary::list_commentary,
        crate::routes::commentary::create_commentary,
        crate::routes::commentary::delete_commentary,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::matches::CreateMatchRequest,
            crate::dto::matches::UpdateMatchRequest,
            crate::dto::matches::UpdateScoreRequest,
            crate::dto::matches::MatchSummary,
            crate::dto::commentary::CreateCommentaryRequest,
            crate::dto::commentary::CommentarySummary,
            crate::dto::ws::ClientCommand,
            crate::dto::ws::ServerMessage,
            crate::state::phase::MatchPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match management"),
        (name = "commentary", description = "Match commentary"),
        (name = "live", description = "WebSocket live updates"),
    )
)]
pub struct ApiDoc;
