//! Match management endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
};
use validator::Validate;

use crate::{
    dto::matches::{
        CreateMatchRequest, ListMatchesQuery, MatchSummary, UpdateMatchRequest, UpdateScoreRequest,
    },
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Routes handling match listing, creation, and updates.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches", get(list_matches).post(create_match))
        .route("/matches/{id}", get(get_match).patch(update_match))
        .route("/matches/{id}/score", patch(update_score))
}

/// List recent matches, newest first.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "matches",
    params(ListMatchesQuery),
    responses(
        (status = 200, description = "Matches listed", body = [MatchSummary])
    )
)]
pub async fn list_matches(
    State(state): State<SharedState>,
    Query(query): Query<ListMatchesQuery>,
) -> Result<Json<Vec<MatchSummary>>, AppError> {
    query.validate()?;
    let matches = match_service::list_matches(&state, query).await?;
    Ok(Json(matches))
}

/// Create a new match and announce it to live clients.
#[utoipa::path(
    post,
    path = "/matches",
    tag = "matches",
    request_body = CreateMatchRequest,
    responses(
        (status = 201, description = "Match created", body = MatchSummary)
    )
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<(StatusCode, Json<MatchSummary>), AppError> {
    payload.validate()?;
    let summary = match_service::create_match(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Load a single match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = i64, Path, description = "Identifier of the match")),
    responses(
        (status = 200, description = "Match found", body = MatchSummary),
        (status = 404, description = "Match not found")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<MatchSummary>, AppError> {
    let summary = match_service::get_match(&state, id).await?;
    Ok(Json(summary))
}

/// Apply a partial update to a match.
#[utoipa::path(
    patch,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = i64, Path, description = "Identifier of the match")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Match updated", body = MatchSummary),
        (status = 404, description = "Match not found")
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    payload.validate()?;
    let summary = match_service::update_match(&state, id, payload).await?;
    Ok(Json(summary))
}

/// Replace both scores of a match and announce the update.
#[utoipa::path(
    patch,
    path = "/matches/{id}/score",
    tag = "matches",
    params(("id" = i64, Path, description = "Identifier of the match")),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = MatchSummary),
        (status = 404, description = "Match not found")
    )
)]
pub async fn update_score(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateScoreRequest>,
) -> Result<Json<MatchSummary>, AppError> {
    payload.validate()?;
    let summary = match_service::update_score(&state, id, payload).await?;
    Ok(Json(summary))
}
