//! Match commentary endpoints, nested under a match identifier.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
};
use validator::Validate;

use crate::{
    dto::commentary::{CommentarySummary, CreateCommentaryRequest, ListCommentaryQuery},
    error::AppError,
    services::commentary_service,
    state::SharedState,
};

/// Routes handling commentary listing, creation, and deletion.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route(
            "/matches/{id}/commentary",
            get(list_commentary).post(create_commentary),
        )
        .route(
            "/matches/{id}/commentary/{commentary_id}",
            delete(delete_commentary),
        )
}

/// List commentary for a match, newest first.
#[utoipa::path(
    get,
    path = "/matches/{id}/commentary",
    tag = "commentary",
    params(
        ("id" = i64, Path, description = "Identifier of the match"),
        ListCommentaryQuery
    ),
    responses(
        (status = 200, description = "Commentary listed", body = [CommentarySummary]),
        (status = 404, description = "Match not found")
    )
)]
pub async fn list_commentary(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<ListCommentaryQuery>,
) -> Result<Json<Vec<CommentarySummary>>, AppError> {
    query.validate()?;
    let entries = commentary_service::list_commentary(&state, id, query).await?;
    Ok(Json(entries))
}

/// Append a commentary entry and deliver it to the match's subscribers.
#[utoipa::path(
    post,
    path = "/matches/{id}/commentary",
    tag = "commentary",
    params(("id" = i64, Path, description = "Identifier of the match")),
    request_body = CreateCommentaryRequest,
    responses(
        (status = 201, description = "Commentary created", body = CommentarySummary),
        (status = 404, description = "Match not found")
    )
)]
pub async fn create_commentary(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateCommentaryRequest>,
) -> Result<(StatusCode, Json<CommentarySummary>), AppError> {
    payload.validate()?;
    let summary = commentary_service::add_commentary(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Delete a commentary entry scoped to its match.
#[utoipa::path(
    delete,
    path = "/matches/{id}/commentary/{commentary_id}",
    tag = "commentary",
    params(
        ("id" = i64, Path, description = "Identifier of the match"),
        ("commentary_id" = i64, Path, description = "Identifier of the commentary entry")
    ),
    responses(
        (status = 200, description = "Commentary deleted", body = CommentarySummary),
        (status = 404, description = "Commentary entry not found")
    )
)]
pub async fn delete_commentary(
    State(state): State<SharedState>,
    Path((id, commentary_id)): Path<(i64, i64)>,
) -> Result<Json<CommentarySummary>, AppError> {
    let summary = commentary_service::delete_commentary(&state, id, commentary_id).await?;
    Ok(Json(summary))
}
