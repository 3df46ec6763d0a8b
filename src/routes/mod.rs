//! HTTP route trees.

use axum::{Router, middleware};

use crate::{services::gatekeeper, state::SharedState};

/// Commentary endpoints.
pub mod commentary;
/// Documentation endpoints.
pub mod docs;
/// Health check endpoints.
pub mod health;
/// Match endpoints.
pub mod matches;
/// WebSocket upgrade endpoint.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    // The gatekeeper middleware guards the REST write path; the WebSocket
    // route performs its own check before the upgrade completes.
    let api_router = matches::router()
        .merge(commentary::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gatekeeper::http_gate,
        ))
        .merge(health::router())
        .merge(websocket::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
