//! Periodic reconciliation of persisted match phases against wall-clock time.

use time::OffsetDateTime;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::{
    dto::matches::MatchSummary,
    services::broadcast::broadcast_status_change,
    state::{SharedState, phase::resolve_phase},
};

/// Run the status sync job for the lifetime of the process.
///
/// Every tick re-derives the phase of each non-terminal match; the task is
/// only stopped when the process shuts down.
pub async fn run_status_sync(state: SharedState) {
    let period = state.config().status_sync_interval;
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick of a tokio interval fires immediately.
    ticker.tick().await;

    info!(period_secs = period.as_secs(), "status sync job running");

    loop {
        ticker.tick().await;
        sync_once(&state, OffsetDateTime::now_utc()).await;
    }
}

/// Run a single status sync pass against `now`.
///
/// Finished matches are excluded by the store query itself, so the workload
/// is bounded by the active-match set. A store failure for one match is
/// logged and skips only that match; it is retried on the next tick.
pub async fn sync_once(state: &SharedState, now: OffsetDateTime) {
    let Some(store) = state.match_store().await else {
        debug!("skipping status sync tick: storage unavailable (degraded mode)");
        return;
    };

    let active = match store.list_unfinished().await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(error = %err, "status sync query failed");
            return;
        }
    };

    for row in active {
        let next = resolve_phase(row.start_time, row.end_time, now);
        if next == row.status {
            continue;
        }

        match store.set_match_phase(row.id, next).await {
            Ok(Some(updated)) => {
                info!(id = updated.id, status = %updated.status, "match status changed");
                broadcast_status_change(state, MatchSummary::from(updated));
            }
            Ok(None) => {
                warn!(id = row.id, "match disappeared during status sync");
            }
            Err(err) => {
                warn!(
                    id = row.id,
                    error = %err,
                    "failed to persist status change; will retry next tick"
                );
            }
        }
    }
}
