//! Sportz backend binary entrypoint wiring REST, WebSocket, and storage layers.

use std::net::SocketAddr;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sportz_back::{
    config::AppConfig,
    routes,
    services::{heartbeat, status_sync},
    state::{AppState, SharedState},
};

use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let port = config.port;

    let app_state = AppState::new(config);

    tokio::spawn(run_store_supervisor(app_state.clone()));
    let heartbeat_task = tokio::spawn(heartbeat::run_heartbeat(app_state.clone()));
    let status_sync_task = tokio::spawn(status_sync::run_status_sync(app_state.clone()));

    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    // Stop the periodic tasks and release every live connection.
    heartbeat_task.abort();
    status_sync_task.abort();
    app_state.shutdown();

    Ok(())
}

/// Supervises the storage connection by retrying in the background and
/// toggling degraded mode when connectivity changes.
#[cfg(feature = "mongo-store")]
async fn run_store_supervisor(state: SharedState) {
    use std::sync::Arc;
    use std::time::Duration;

    use sportz_back::dao::match_store::mongodb::{MongoConfig, MongoMatchStore};
    use tokio::time::sleep;
    use tracing::{error, warn};

    let initial_delay_ms = 1000;
    let mut delay = Duration::from_millis(initial_delay_ms);
    let max_delay = Duration::from_secs(10);

    loop {
        if let Some(store) = state.match_store().await {
            match store.health_check().await {
                Ok(_) => {
                    // Healthy connection: reset the retry backoff and avoid
                    // hammering the database with pings.
                    delay = Duration::from_millis(initial_delay_ms);
                    sleep(Duration::from_secs(5)).await;
                }
                Err(err) => {
                    // Existing connection failed: drop it, flip to degraded
                    // mode, and retry with exponential backoff.
                    warn!(error = %err, "storage ping failed; entering degraded mode");
                    state.clear_match_store().await;
                    sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
            continue;
        }

        let config = state.config();
        let mongo_config =
            match MongoConfig::from_uri(&config.mongo_uri, config.mongo_db.as_deref()).await {
                Ok(mongo_config) => mongo_config,
                Err(err) => {
                    error!(%err, "invalid storage configuration");
                    sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                    continue;
                }
            };

        match MongoMatchStore::connect(mongo_config).await {
            Ok(store) => {
                // Fresh connection with indexes ready: install it and leave
                // degraded mode.
                info!("connected to storage; leaving degraded mode");
                state.install_match_store(Arc::new(store)).await;
                delay = Duration::from_millis(initial_delay_ms);
            }
            Err(err) => {
                // Could not reach the database at all: wait and retry with
                // exponential backoff.
                warn!(error = %err, "storage connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
        }
    }
}

/// Without a storage backend compiled in, the service stays degraded.
#[cfg(not(feature = "mongo-store"))]
async fn run_store_supervisor(_state: SharedState) {
    tracing::warn!("built without a storage backend; running in degraded mode");
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
