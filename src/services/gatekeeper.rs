//! Access-control checks applied before a connection is accepted.
//!
//! The gatekeeper is consulted once per REST request and once per WebSocket
//! upgrade. Rejections fall into three distinguishable classes: rate-limited
//! (429), denied (403), and gatekeeper failure (503).

use std::collections::{HashSet, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::{error, warn};

use crate::{error::AppError, state::SharedState};

/// Outcome of a gatekeeper check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// The connection may proceed.
    Allow,
    /// The peer exhausted its rate budget.
    RateLimited,
    /// The peer is denied by policy.
    Denied,
}

/// Error raised when the gatekeeper itself cannot produce a decision.
#[derive(Debug, Error)]
pub enum GatekeeperError {
    /// The underlying policy service could not be reached.
    #[error("gatekeeper unavailable: {0}")]
    Unavailable(String),
}

/// Policy collaborator invoked before a connection is accepted.
pub trait ConnectionGatekeeper: Send + Sync {
    /// Decide whether a peer may connect.
    fn check(&self, peer: IpAddr) -> BoxFuture<'static, Result<GateDecision, GatekeeperError>>;
}

/// In-process gatekeeper combining a static deny list with a per-peer
/// sliding-window rate limit.
pub struct SlidingWindowGatekeeper {
    window: Duration,
    max_hits: usize,
    deny_list: HashSet<IpAddr>,
    hits: DashMap<IpAddr, VecDeque<Instant>>,
}

impl SlidingWindowGatekeeper {
    /// Create a gatekeeper allowing `max_hits` per peer inside `window`.
    pub fn new(window: Duration, max_hits: usize, deny_list: impl IntoIterator<Item = IpAddr>) -> Self {
        Self {
            window,
            max_hits,
            deny_list: deny_list.into_iter().collect(),
            hits: DashMap::new(),
        }
    }

    /// Evaluate a peer against the deny list and its rate window at `now`.
    fn check_at(&self, peer: IpAddr, now: Instant) -> GateDecision {
        if self.deny_list.contains(&peer) {
            return GateDecision::Denied;
        }

        let mut window = self.hits.entry(peer).or_default();
        while window
            .front()
            .is_some_and(|hit| now.duration_since(*hit) >= self.window)
        {
            window.pop_front();
        }

        if window.len() >= self.max_hits {
            return GateDecision::RateLimited;
        }

        window.push_back(now);
        GateDecision::Allow
    }
}

impl ConnectionGatekeeper for SlidingWindowGatekeeper {
    fn check(&self, peer: IpAddr) -> BoxFuture<'static, Result<GateDecision, GatekeeperError>> {
        let decision = self.check_at(peer, Instant::now());
        Box::pin(async move { Ok(decision) })
    }
}

/// Axum middleware rejecting REST requests per the HTTP gatekeeper.
pub async fn http_gate(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let Some(gatekeeper) = state.http_gatekeeper() else {
        return next.run(request).await;
    };

    match gatekeeper.check(addr.ip()).await {
        Ok(GateDecision::Allow) => next.run(request).await,
        Ok(GateDecision::RateLimited) => {
            warn!(peer = %addr.ip(), "rate limited request");
            AppError::TooManyRequests("too many requests".into()).into_response()
        }
        Ok(GateDecision::Denied) => {
            warn!(peer = %addr.ip(), "denied request");
            AppError::Forbidden("forbidden".into()).into_response()
        }
        Err(err) => {
            error!(error = %err, "gatekeeper check failed");
            AppError::ServiceUnavailable("access control unavailable".into()).into_response()
        }
    }
}
