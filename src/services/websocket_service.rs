//! Lifecycle handling for individual WebSocket connections.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::atomic::Ordering;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{ClientCommand, RawMatchId, ServerMessage},
    services::broadcast::send_to_connection,
    state::{SharedState, registry::ClientConnection},
};

/// Handle the full lifecycle for an individual client WebSocket connection.
///
/// The connection is registered, greeted with a welcome message, then its
/// inbound frames are dispatched in arrival order until the peer closes, the
/// socket errors, or the liveness sweep terminates it. On exit the connection
/// is deregistered and all of its subscriptions are cleaned up.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let client_id = Uuid::new_v4();
    let connection = ClientConnection::new(client_id, outbound_tx.clone());
    let alive = connection.liveness();
    let shutdown = connection.shutdown_handle();
    state.registry().register(connection);

    info!(id = %client_id, "client connected");

    send_to_connection(&outbound_tx, &ServerMessage::Welcome);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!(id = %client_id, "connection terminated by registry");
                let _ = outbound_tx.send(Message::Close(None));
                break;
            }
            inbound = receiver.next() => {
                let Some(inbound) = inbound else { break };
                match inbound {
                    Ok(Message::Text(text)) => {
                        dispatch_command(&state, client_id, &outbound_tx, &text);
                    }
                    Ok(Message::Ping(payload)) => {
                        let _ = outbound_tx.send(Message::Pong(payload));
                    }
                    Ok(Message::Pong(_)) => {
                        alive.store(true, Ordering::Release);
                    }
                    Ok(Message::Close(frame)) => {
                        info!(id = %client_id, "client closed");
                        let _ = outbound_tx.send(Message::Close(frame));
                        break;
                    }
                    Ok(Message::Binary(_)) => {}
                    Err(err) => {
                        warn!(id = %client_id, error = %err, "websocket error");
                        break;
                    }
                }
            }
        }
    }

    state.registry().unregister(&client_id);
    state.subscriptions().cleanup(client_id);
    info!(id = %client_id, "client disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Dispatch one inbound text frame.
///
/// Malformed payloads, unrecognized message types, and identifiers that are
/// empty after normalization are silently discarded; the connection stays
/// open either way.
fn dispatch_command(
    state: &SharedState,
    client_id: Uuid,
    outbound_tx: &mpsc::UnboundedSender<Message>,
    text: &str,
) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(err) => {
            debug!(id = %client_id, error = %err, "discarding malformed client message");
            return;
        }
    };

    match command {
        ClientCommand::Subscribe { match_id } => {
            let Some(key) = normalized(client_id, &match_id) else {
                return;
            };
            state.subscriptions().subscribe(key.clone(), client_id);
            send_to_connection(
                outbound_tx,
                &ServerMessage::Subscribed {
                    match_id: key.to_string(),
                },
            );
        }
        ClientCommand::Unsubscribe { match_id } => {
            let Some(key) = normalized(client_id, &match_id) else {
                return;
            };
            state.subscriptions().unsubscribe(&key, client_id);
            send_to_connection(
                outbound_tx,
                &ServerMessage::Unsubscribed {
                    match_id: key.to_string(),
                },
            );
        }
        ClientCommand::Unknown => {
            debug!(id = %client_id, "discarding unrecognized client message");
        }
    }
}

fn normalized(
    client_id: Uuid,
    match_id: &RawMatchId,
) -> Option<crate::state::subscriptions::MatchKey> {
    let key = match_id.normalize();
    if key.is_none() {
        debug!(id = %client_id, "discarding command with empty match id");
    }
    key
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, subscriptions::MatchKey},
    };

    fn attach_client(
        state: &SharedState,
    ) -> (Uuid, mpsc::UnboundedSender<Message>, UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state.registry().register(ClientConnection::new(id, tx.clone()));
        (id, tx, rx)
    }

    fn next_json(rx: &mut UnboundedReceiver<Message>) -> serde_json::Value {
        match rx.try_recv() {
            Ok(Message::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a text frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribe_command_registers_and_acks() {
        let state = AppState::new(AppConfig::default());
        let (id, tx, mut rx) = attach_client(&state);

        dispatch_command(&state, id, &tx, r#"{"type":"subscribe","matchId":7}"#);

        assert_eq!(
            state.subscriptions().subscribers_of(&MatchKey::from_id(7)),
            vec![id]
        );
        let ack = next_json(&mut rx);
        assert_eq!(ack["type"], "subscribed");
        assert_eq!(ack["matchId"], "7");
    }

    #[tokio::test]
    async fn unsubscribe_command_removes_and_acks() {
        let state = AppState::new(AppConfig::default());
        let (id, tx, mut rx) = attach_client(&state);

        dispatch_command(&state, id, &tx, r#"{"type":"subscribe","matchId":"7"}"#);
        dispatch_command(&state, id, &tx, r#"{"type":"unsubscribe","matchId":7}"#);

        assert!(
            state
                .subscriptions()
                .subscribers_of(&MatchKey::from_id(7))
                .is_empty()
        );
        assert_eq!(next_json(&mut rx)["type"], "subscribed");
        let ack = next_json(&mut rx);
        assert_eq!(ack["type"], "unsubscribed");
        assert_eq!(ack["matchId"], "7");
    }

    #[tokio::test]
    async fn malformed_messages_are_discarded_silently() {
        let state = AppState::new(AppConfig::default());
        let (id, tx, mut rx) = attach_client(&state);

        dispatch_command(&state, id, &tx, "not json at all");
        dispatch_command(&state, id, &tx, r#"{"type":"subscribe"}"#);
        dispatch_command(&state, id, &tx, r#"{"type":"dance","matchId":1}"#);
        dispatch_command(&state, id, &tx, r#"{"type":"subscribe","matchId":"  "}"#);

        assert!(rx.try_recv().is_err());
        assert_eq!(state.subscriptions().tracked_matches(), 0);
    }
}
