//! Shared application state: storage handle, connection registry, and
//! subscription index.

pub mod phase;
pub mod registry;
pub mod subscriptions;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig,
    dao::match_store::MatchStore,
    error::ServiceError,
    services::gatekeeper::{ConnectionGatekeeper, SlidingWindowGatekeeper},
};

use self::{registry::ConnectionRegistry, subscriptions::SubscriptionIndex};

/// Cheaply clonable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state storing live connections, subscriptions, and the
/// database handle.
///
/// Constructed once at startup and passed explicitly to every component that
/// needs it; the registry and index are mutated only through the handlers and
/// background tasks defined in this crate.
pub struct AppState {
    config: AppConfig,
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    registry: ConnectionRegistry,
    subscriptions: SubscriptionIndex,
    degraded: watch::Sender<bool>,
    http_gatekeeper: Option<Arc<dyn ConnectionGatekeeper>>,
    ws_gatekeeper: Option<Arc<dyn ConnectionGatekeeper>>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);

        let (http_gatekeeper, ws_gatekeeper) = if config.rate_limiting_enabled {
            let http: Arc<dyn ConnectionGatekeeper> = Arc::new(SlidingWindowGatekeeper::new(
                config.http_rate_window,
                config.http_rate_max,
                config.blocked_ips.clone(),
            ));
            let ws: Arc<dyn ConnectionGatekeeper> = Arc::new(SlidingWindowGatekeeper::new(
                config.ws_rate_window,
                config.ws_rate_max,
                config.blocked_ips.clone(),
            ));
            (Some(http), Some(ws))
        } else {
            (None, None)
        };

        Arc::new(Self {
            config,
            match_store: RwLock::new(None),
            registry: ConnectionRegistry::new(),
            subscriptions: SubscriptionIndex::new(),
            degraded: degraded_tx,
            http_gatekeeper,
            ws_gatekeeper,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the match store or fail with a degraded-mode error.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new match store implementation and leave degraded mode.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        {
            let mut guard = self.match_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current match store and enter degraded mode.
    pub async fn clear_match_store(&self) {
        {
            let mut guard = self.match_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.match_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Registry of live WebSocket connections.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Index of per-match subscriptions.
    pub fn subscriptions(&self) -> &SubscriptionIndex {
        &self.subscriptions
    }

    /// Gatekeeper consulted for REST requests, if rate limiting is enabled.
    pub fn http_gatekeeper(&self) -> Option<Arc<dyn ConnectionGatekeeper>> {
        self.http_gatekeeper.clone()
    }

    /// Gatekeeper consulted for WebSocket upgrades, if rate limiting is
    /// enabled.
    pub fn ws_gatekeeper(&self) -> Option<Arc<dyn ConnectionGatekeeper>> {
        self.ws_gatekeeper.clone()
    }

    /// Release live resources during process shutdown: close every
    /// connection and drop all subscriptions.
    pub fn shutdown(&self) {
        let closed = self.registry.close_all();
        self.subscriptions.clear();
        tracing::info!(closed, "released connection registry");
    }

    /// Update and broadcast the degraded flag when the value changes.
    async fn update_degraded(&self, value: bool) {
        if *self.degraded.borrow() == value {
            return;
        }

        let _ = self.degraded.send(value);
    }
}
