//! Fan-out of server messages to live WebSocket connections.
//!
//! Delivery is fire-and-forget: a message is serialized once and offered to
//! each target's writer channel; peers whose writer has closed are skipped.
//! A failed delivery never propagates to the caller.

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    dto::{commentary::CommentarySummary, matches::MatchSummary, ws::ServerMessage},
    state::{SharedState, subscriptions::MatchKey},
};

/// Deliver `message` to every live connection in the registry.
pub fn broadcast_global(state: &SharedState, message: &ServerMessage) {
    let Some(payload) = serialize(message) else {
        return;
    };

    for (id, tx) in state.registry().live_connections() {
        if tx.send(Message::Text(payload.clone().into())).is_err() {
            debug!(id = %id, "skipping delivery to closed connection");
        }
    }
}

/// Deliver `message` only to the current subscribers of `key`.
///
/// A no-op when nobody is subscribed.
pub fn broadcast_to_match(state: &SharedState, key: &MatchKey, message: &ServerMessage) {
    let subscribers = state.subscriptions().subscribers_of(key);
    if subscribers.is_empty() {
        return;
    }

    let Some(payload) = serialize(message) else {
        return;
    };

    for id in subscribers {
        let Some(tx) = state.registry().sender_of(&id) else {
            continue;
        };
        if tx.send(Message::Text(payload.clone().into())).is_err() {
            debug!(id = %id, "skipping delivery to closed subscriber");
        }
    }
}

/// Queue `message` on a single connection's writer channel.
///
/// Returns `false` when the writer has already closed.
pub fn send_to_connection(tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) -> bool {
    let Some(payload) = serialize(message) else {
        return true;
    };

    tx.send(Message::Text(payload.into())).is_ok()
}

/// Announce a freshly created match to every connection.
pub fn broadcast_match_created(state: &SharedState, data: MatchSummary) {
    broadcast_global(state, &ServerMessage::MatchCreated { data });
}

/// Announce a score change to every connection.
pub fn broadcast_score_update(state: &SharedState, data: MatchSummary) {
    broadcast_global(state, &ServerMessage::ScoreUpdate { data });
}

/// Announce a phase transition to every connection.
pub fn broadcast_status_change(state: &SharedState, data: MatchSummary) {
    broadcast_global(state, &ServerMessage::StatusChange { data });
}

/// Deliver a new commentary entry to the subscribers of its match.
pub fn broadcast_commentary_added(state: &SharedState, data: CommentarySummary) {
    let key = MatchKey::from_id(data.match_id);
    broadcast_to_match(state, &key, &ServerMessage::CommentaryAdded { data });
}

fn serialize(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(error = %err, "failed to serialize server message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, registry::ClientConnection},
    };

    fn attach_client(state: &SharedState) -> (Uuid, UnboundedReceiver<Message>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state.registry().register(ClientConnection::new(id, tx));
        (id, rx)
    }

    fn received_types(rx: &mut UnboundedReceiver<Message>) -> Vec<String> {
        let mut types = Vec::new();
        while let Ok(Message::Text(text)) = rx.try_recv() {
            let value: serde_json::Value = serde_json::from_str(&text).unwrap();
            types.push(value["type"].as_str().unwrap().to_string());
        }
        types
    }

    #[tokio::test]
    async fn global_broadcast_reaches_every_open_connection() {
        let state = AppState::new(AppConfig::default());
        let (_a, mut rx_a) = attach_client(&state);
        let (_b, mut rx_b) = attach_client(&state);

        broadcast_global(&state, &ServerMessage::Welcome);

        assert_eq!(received_types(&mut rx_a), vec!["welcome"]);
        assert_eq!(received_types(&mut rx_b), vec!["welcome"]);
    }

    #[tokio::test]
    async fn match_scoped_broadcast_reaches_only_subscribers() {
        let state = AppState::new(AppConfig::default());
        let (a, mut rx_a) = attach_client(&state);
        let (b, mut rx_b) = attach_client(&state);
        let (_c, mut rx_c) = attach_client(&state);

        let key = MatchKey::from_id(7);
        state.subscriptions().subscribe(key.clone(), a);
        state.subscriptions().subscribe(key.clone(), b);

        broadcast_to_match(
            &state,
            &key,
            &ServerMessage::Subscribed {
                match_id: key.to_string(),
            },
        );

        assert_eq!(received_types(&mut rx_a), vec!["subscribed"]);
        assert_eq!(received_types(&mut rx_b), vec!["subscribed"]);
        assert!(received_types(&mut rx_c).is_empty());
    }

    #[tokio::test]
    async fn empty_subscriber_set_is_a_silent_no_op() {
        let state = AppState::new(AppConfig::default());
        let (_a, mut rx_a) = attach_client(&state);

        broadcast_to_match(&state, &MatchKey::from_id(99), &ServerMessage::Welcome);

        assert!(received_types(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn closed_connection_does_not_abort_delivery_to_others() {
        let state = AppState::new(AppConfig::default());
        let (_dead, dead_rx) = attach_client(&state);
        drop(dead_rx);
        let (_live, mut live_rx) = attach_client(&state);

        broadcast_global(&state, &ServerMessage::Welcome);

        assert_eq!(received_types(&mut live_rx), vec!["welcome"]);
    }
}
