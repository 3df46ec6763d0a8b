//! Commentary write and read operations.

use crate::{
    dao::models::NewCommentary,
    dto::commentary::{CommentarySummary, CreateCommentaryRequest, ListCommentaryQuery},
    error::ServiceError,
    services::broadcast::broadcast_commentary_added,
    state::SharedState,
};

/// Default number of rows returned by a listing.
const DEFAULT_LIST_LIMIT: i64 = 100;
/// Hard cap on listing sizes.
const MAX_LIST_LIMIT: i64 = 100;

/// List commentary for a match, newest first.
pub async fn list_commentary(
    state: &SharedState,
    match_id: i64,
    query: ListCommentaryQuery,
) -> Result<Vec<CommentarySummary>, ServiceError> {
    let store = state.require_match_store().await?;
    ensure_match_exists(state, match_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).min(MAX_LIST_LIMIT);
    let rows = store.list_commentary(match_id, limit).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Append a commentary entry to a match and deliver it to the match's
/// subscribers.
pub async fn add_commentary(
    state: &SharedState,
    match_id: i64,
    payload: CreateCommentaryRequest,
) -> Result<CommentarySummary, ServiceError> {
    let store = state.require_match_store().await?;
    ensure_match_exists(state, match_id).await?;

    let record = store
        .insert_commentary(NewCommentary {
            match_id,
            minute: payload.minute,
            sequence: payload.sequence,
            period: payload.period,
            event_type: payload.event_type,
            actor: payload.actor,
            team: payload.team,
            message: payload.message,
            metadata: payload.metadata,
            tags: payload.tags,
        })
        .await?;

    let summary = CommentarySummary::from(record);
    broadcast_commentary_added(state, summary.clone());
    Ok(summary)
}

/// Delete a commentary entry scoped to its match.
pub async fn delete_commentary(
    state: &SharedState,
    match_id: i64,
    id: i64,
) -> Result<CommentarySummary, ServiceError> {
    let store = state.require_match_store().await?;

    let deleted = store
        .delete_commentary(match_id, id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("commentary entry `{id}` not found")))?;

    Ok(deleted.into())
}

async fn ensure_match_exists(state: &SharedState, match_id: i64) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    store
        .find_match(match_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}` not found")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::extract::ws::Message;
    use time::macros::datetime;
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::testing::InMemoryMatchStore,
        state::{
            AppState, phase::MatchPhase, registry::ClientConnection, subscriptions::MatchKey,
        },
    };

    async fn state_with_match() -> (crate::state::SharedState, i64) {
        let state = AppState::new(AppConfig::default());
        let store = Arc::new(InMemoryMatchStore::new());
        let row = store.seed_match(
            MatchPhase::Live,
            datetime!(2026-03-01 12:00:00 UTC),
            datetime!(2026-03-01 14:00:00 UTC),
        );
        state.install_match_store(store).await;
        (state, row.id)
    }

    fn attach_client(state: &crate::state::SharedState) -> (Uuid, UnboundedReceiver<Message>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state.registry().register(ClientConnection::new(id, tx));
        (id, rx)
    }

    fn commentary_events(rx: &mut UnboundedReceiver<Message>) -> Vec<serde_json::Value> {
        let mut events = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            if value["type"] == "commentary_added" {
                events.push(value);
            }
        }
        events
    }

    fn goal_payload() -> CreateCommentaryRequest {
        serde_json::from_value(serde_json::json!({
            "message": "Goal!",
            "minute": 45,
            "eventType": "goal",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn commentary_is_delivered_to_subscribers_only() {
        let (state, match_id) = state_with_match().await;

        let (a, mut rx_a) = attach_client(&state);
        let (b, mut rx_b) = attach_client(&state);
        let (_c, mut rx_c) = attach_client(&state);

        let key = MatchKey::from_id(match_id);
        state.subscriptions().subscribe(key.clone(), a);
        state.subscriptions().subscribe(key, b);

        let summary = add_commentary(&state, match_id, goal_payload()).await.unwrap();
        assert_eq!(summary.match_id, match_id);

        for rx in [&mut rx_a, &mut rx_b] {
            let events = commentary_events(rx);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0]["data"]["message"], "Goal!");
        }
        assert!(commentary_events(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn commentary_for_missing_match_is_not_found() {
        let (state, _match_id) = state_with_match().await;

        let result = add_commentary(&state, 999, goal_payload()).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_scoped_to_the_match() {
        let (state, match_id) = state_with_match().await;
        let summary = add_commentary(&state, match_id, goal_payload()).await.unwrap();

        // Wrong match id: not found, entry stays.
        let result = delete_commentary(&state, match_id + 1, summary.id).await;
        assert!(matches!(result, Err(ServiceError::NotFound(_))));

        let deleted = delete_commentary(&state, match_id, summary.id).await.unwrap();
        assert_eq!(deleted.id, summary.id);

        let remaining = list_commentary(&state, match_id, ListCommentaryQuery::default())
            .await
            .unwrap();
        assert!(remaining.is_empty());
    }
}
