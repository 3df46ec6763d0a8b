//! Match write and read operations.
//!
//! Every successful write persists first and broadcasts second, so clients
//! are never notified of a row that is not yet queryable.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{
    dao::models::{MatchPatch, NewMatch},
    dto::matches::{CreateMatchRequest, ListMatchesQuery, MatchSummary, UpdateMatchRequest, UpdateScoreRequest},
    error::ServiceError,
    services::broadcast::{broadcast_match_created, broadcast_score_update, broadcast_status_change},
    state::{SharedState, phase::resolve_phase},
};

/// Default number of rows returned by a listing.
const DEFAULT_LIST_LIMIT: i64 = 50;
/// Hard cap on listing sizes.
const MAX_LIST_LIMIT: i64 = 100;

/// List matches, newest first.
pub async fn list_matches(
    state: &SharedState,
    query: ListMatchesQuery,
) -> Result<Vec<MatchSummary>, ServiceError> {
    let store = state.require_match_store().await?;
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);

    let rows = store.list_matches(limit).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Create a match, deriving its initial phase from the window, and announce
/// it to every connection.
pub async fn create_match(
    state: &SharedState,
    payload: CreateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_match_store().await?;

    let (start_time, end_time) = payload.window().ok_or_else(|| {
        ServiceError::InvalidInput("startTime and endTime must be valid RFC 3339 instants".into())
    })?;
    // The stored status is always derived, never client-set.
    let status = resolve_phase(start_time, end_time, OffsetDateTime::now_utc());

    let record = store
        .insert_match(NewMatch {
            sport: payload.sport,
            home_team: payload.home_team,
            away_team: payload.away_team,
            status,
            start_time,
            end_time,
            home_score: payload.home_score.unwrap_or(0),
            away_score: payload.away_score.unwrap_or(0),
        })
        .await?;

    let summary = MatchSummary::from(record);
    broadcast_match_created(state, summary.clone());
    Ok(summary)
}

/// Load a single match.
pub async fn get_match(state: &SharedState, id: i64) -> Result<MatchSummary, ServiceError> {
    let store = state.require_match_store().await?;
    let record = store
        .find_match(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{id}` not found")))?;

    Ok(record.into())
}

/// Apply a partial update to a match.
///
/// When the window changes and no explicit status was supplied, the status is
/// re-derived from the new window; a resulting phase change is announced the
/// same way the scheduler announces one.
pub async fn update_match(
    state: &SharedState,
    id: i64,
    payload: UpdateMatchRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_match_store().await?;

    let existing = store
        .find_match(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{id}` not found")))?;

    let start_time = parse_instant(payload.start_time.as_deref())?;
    let end_time = parse_instant(payload.end_time.as_deref())?;

    let window_changed = start_time.is_some() || end_time.is_some();
    let next_start = start_time.unwrap_or(existing.start_time);
    let next_end = end_time.unwrap_or(existing.end_time);
    if next_end <= next_start {
        return Err(ServiceError::InvalidInput(
            "endTime must be after startTime".into(),
        ));
    }

    let status = payload.status.or_else(|| {
        window_changed.then(|| resolve_phase(next_start, next_end, OffsetDateTime::now_utc()))
    });

    let updated = store
        .update_match(
            id,
            MatchPatch {
                sport: payload.sport,
                home_team: payload.home_team,
                away_team: payload.away_team,
                status,
                start_time,
                end_time,
            },
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{id}` not found")))?;

    let summary = MatchSummary::from(updated);
    if summary.status != existing.status {
        broadcast_status_change(state, summary.clone());
    }
    Ok(summary)
}

/// Replace both scores of a match and announce the update.
pub async fn update_score(
    state: &SharedState,
    id: i64,
    payload: UpdateScoreRequest,
) -> Result<MatchSummary, ServiceError> {
    let store = state.require_match_store().await?;

    let updated = store
        .update_score(id, payload.home_score, payload.away_score)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{id}` not found")))?;

    let summary = MatchSummary::from(updated);
    broadcast_score_update(state, summary.clone());
    Ok(summary)
}

fn parse_instant(value: Option<&str>) -> Result<Option<OffsetDateTime>, ServiceError> {
    value
        .map(|raw| {
            OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| {
                ServiceError::InvalidInput(format!("`{raw}` is not a valid RFC 3339 instant"))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::ws::Message;
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::testing::InMemoryMatchStore,
        state::{AppState, phase::MatchPhase, registry::ClientConnection},
    };

    async fn state_with_store() -> (crate::state::SharedState, Arc<InMemoryMatchStore>) {
        let state = AppState::new(AppConfig::default());
        let store = Arc::new(InMemoryMatchStore::new());
        state.install_match_store(store.clone()).await;
        (state, store)
    }

    fn attach_client(state: &crate::state::SharedState) -> UnboundedReceiver<Message> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        state
            .registry()
            .register(ClientConnection::new(Uuid::new_v4(), tx));
        rx
    }

    fn received_types(rx: &mut UnboundedReceiver<Message>) -> Vec<String> {
        let mut types = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            types.push(value["type"].as_str().unwrap().to_string());
        }
        types
    }

    fn future_match_payload() -> CreateMatchRequest {
        serde_json::from_value(serde_json::json!({
            "sport": "football",
            "homeTeam": "Team A",
            "awayTeam": "Team B",
            "startTime": "2100-03-01T12:00:00Z",
            "endTime": "2100-03-01T14:00:00Z",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn create_derives_status_and_broadcasts_after_persisting() {
        let (state, store) = state_with_store().await;
        let mut rx = attach_client(&state);

        let summary = create_match(&state, future_match_payload()).await.unwrap();

        assert_eq!(summary.status, MatchPhase::Scheduled);
        assert_eq!(store.phase_of(summary.id), Some(MatchPhase::Scheduled));
        assert_eq!(received_types(&mut rx), vec!["match_created"]);
    }

    #[tokio::test]
    async fn create_fails_in_degraded_mode_without_broadcasting() {
        let state = AppState::new(AppConfig::default());
        let mut rx = attach_client(&state);

        let result = create_match(&state, future_match_payload()).await;

        assert!(matches!(result, Err(ServiceError::Degraded)));
        assert!(received_types(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn score_update_broadcasts_the_updated_row() {
        let (state, _store) = state_with_store().await;
        let created = create_match(&state, future_match_payload()).await.unwrap();
        let mut rx = attach_client(&state);

        let payload: UpdateScoreRequest =
            serde_json::from_value(serde_json::json!({"homeScore": 2, "awayScore": 1})).unwrap();
        let summary = update_score(&state, created.id, payload).await.unwrap();

        assert_eq!((summary.home_score, summary.away_score), (2, 1));
        assert_eq!(received_types(&mut rx), vec!["score_update"]);
    }

    #[tokio::test]
    async fn score_update_on_missing_match_is_not_found() {
        let (state, _store) = state_with_store().await;

        let payload: UpdateScoreRequest =
            serde_json::from_value(serde_json::json!({"homeScore": 1, "awayScore": 0})).unwrap();
        let result = update_score(&state, 999, payload).await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn rewriting_the_window_rederives_status_and_announces_it() {
        let (state, store) = state_with_store().await;
        let created = create_match(&state, future_match_payload()).await.unwrap();
        let mut rx = attach_client(&state);

        // Move the window into the past: the match is now finished.
        let payload: UpdateMatchRequest = serde_json::from_value(serde_json::json!({
            "startTime": "2020-03-01T12:00:00Z",
            "endTime": "2020-03-01T14:00:00Z",
        }))
        .unwrap();
        let summary = update_match(&state, created.id, payload).await.unwrap();

        assert_eq!(summary.status, MatchPhase::Finished);
        assert_eq!(store.phase_of(created.id), Some(MatchPhase::Finished));
        assert_eq!(received_types(&mut rx), vec!["status_change"]);
    }

    #[tokio::test]
    async fn update_rejects_inverted_windows() {
        let (state, _store) = state_with_store().await;
        let created = create_match(&state, future_match_payload()).await.unwrap();

        let payload: UpdateMatchRequest = serde_json::from_value(serde_json::json!({
            "endTime": "2000-01-01T00:00:00Z",
        }))
        .unwrap();
        let result = update_match(&state, created.id, payload).await;

        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }
}
