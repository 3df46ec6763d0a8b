//! WebSocket upgrade endpoint.

use std::net::SocketAddr;

use axum::{
    Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::{error, warn};

use crate::{
    error::AppError,
    services::{gatekeeper::GateDecision, websocket_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "live",
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 429, description = "Too many connection attempts"),
        (status = 403, description = "Connection denied"),
        (status = 503, description = "Access control unavailable")
    )
)]
/// Upgrade the HTTP connection into a live-update WebSocket session.
///
/// The gatekeeper is consulted before the upgrade completes, so rejected
/// peers never reach the command handler.
pub async fn ws_handler(
    State(state): State<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    if let Some(gatekeeper) = state.ws_gatekeeper() {
        match gatekeeper.check(addr.ip()).await {
            Ok(GateDecision::Allow) => {}
            Ok(GateDecision::RateLimited) => {
                warn!(peer = %addr.ip(), "rate limited websocket upgrade");
                return AppError::TooManyRequests("too many connection attempts".into())
                    .into_response();
            }
            Ok(GateDecision::Denied) => {
                warn!(peer = %addr.ip(), "denied websocket upgrade");
                return AppError::Forbidden("connection denied".into()).into_response();
            }
            Err(err) => {
                error!(error = %err, "gatekeeper check failed during websocket upgrade");
                return AppError::ServiceUnavailable("access control unavailable".into())
                    .into_response();
            }
        }
    }

    let max_frame = state.config().max_frame_bytes;
    let shared_state = state.clone();
    ws.max_message_size(max_frame)
        .max_frame_size(max_frame)
        .on_upgrade(move |socket| websocket_service::handle_socket(shared_state, socket))
        .into_response()
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/ws", get(ws_handler))
}
