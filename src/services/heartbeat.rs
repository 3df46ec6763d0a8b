//! Periodic liveness sweep over the connection registry.

use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};

use crate::state::SharedState;

/// Run the heartbeat sweep for the lifetime of the process.
///
/// Each sweep terminates connections that failed to answer the previous ping
/// and pings the rest; a connection that never replies is evicted on the
/// second sweep after going silent, bounding stale-connection lifetime to
/// roughly two heartbeat intervals.
pub async fn run_heartbeat(state: SharedState) {
    let period = state.config().heartbeat_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately.
    ticker.tick().await;

    info!(period_secs = period.as_secs(), "heartbeat sweep running");

    loop {
        ticker.tick().await;
        sweep_once(&state);
    }
}

/// Run a single sweep, cascading eviction into subscription cleanup.
pub fn sweep_once(state: &SharedState) {
    for id in state.registry().sweep() {
        state.subscriptions().cleanup(id);
        warn!(id = %id, "evicted unresponsive connection");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use axum::extract::ws::Message;
    use tokio::sync::mpsc;
    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, registry::ClientConnection, subscriptions::MatchKey},
    };

    #[tokio::test]
    async fn two_missed_sweeps_evict_and_clean_up_subscriptions() {
        let state = AppState::new(AppConfig::default());

        let (tx, _rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        state.registry().register(ClientConnection::new(id, tx));
        state.subscriptions().subscribe(MatchKey::from_id(7), id);

        // First sweep clears the flag and pings; the peer never answers.
        sweep_once(&state);
        assert_eq!(state.registry().connection_count(), 1);

        // Second sweep evicts and cascades into subscription cleanup.
        sweep_once(&state);
        assert_eq!(state.registry().connection_count(), 0);
        assert!(
            state
                .subscriptions()
                .subscribers_of(&MatchKey::from_id(7))
                .is_empty()
        );
        assert_eq!(state.subscriptions().tracked_matches(), 0);
    }

    #[tokio::test]
    async fn responsive_connection_survives_repeated_sweeps() {
        let state = AppState::new(AppConfig::default());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let connection = ClientConnection::new(id, tx);
        let alive = connection.liveness();
        state.registry().register(connection);

        for _ in 0..4 {
            sweep_once(&state);
            // The socket task records the peer's pong before the next sweep.
            assert!(matches!(rx.try_recv(), Ok(Message::Ping(_))));
            alive.store(true, Ordering::Release);
        }

        assert_eq!(state.registry().connection_count(), 1);
    }
}
