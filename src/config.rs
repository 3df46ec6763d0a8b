//! Application-level configuration loaded from the environment at startup.

use std::{env, net::IpAddr, time::Duration};

use tracing::{info, warn};

/// Default TCP port the server listens on.
const DEFAULT_PORT: u16 = 8000;
/// Default MongoDB connection string used when `MONGO_URI` is unset.
const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
/// Default heartbeat sweep period in seconds.
const DEFAULT_HEARTBEAT_SECS: u64 = 30;
/// Default status sync period in seconds.
const DEFAULT_STATUS_SYNC_SECS: u64 = 60;
/// Default per-message WebSocket payload cap.
const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;
/// Default HTTP rate budget: requests per window.
const DEFAULT_HTTP_RATE_MAX: usize = 50;
/// Default HTTP rate window in seconds.
const DEFAULT_HTTP_RATE_WINDOW_SECS: u64 = 10;
/// Default WebSocket upgrade rate budget: attempts per window.
const DEFAULT_WS_RATE_MAX: usize = 5;
/// Default WebSocket upgrade rate window in seconds.
const DEFAULT_WS_RATE_WINDOW_SECS: u64 = 2;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// TCP port the HTTP server binds to.
    pub port: u16,
    /// MongoDB connection string.
    pub mongo_uri: String,
    /// MongoDB database name override.
    pub mongo_db: Option<String>,
    /// Period between heartbeat sweeps of the connection registry.
    pub heartbeat_interval: Duration,
    /// Period between status sync ticks.
    pub status_sync_interval: Duration,
    /// Largest WebSocket message accepted from a client.
    pub max_frame_bytes: usize,
    /// Whether the connection gatekeeper is active.
    pub rate_limiting_enabled: bool,
    /// Sliding window applied to HTTP requests per peer address.
    pub http_rate_window: Duration,
    /// Maximum HTTP requests allowed per peer inside the window.
    pub http_rate_max: usize,
    /// Sliding window applied to WebSocket upgrades per peer address.
    pub ws_rate_window: Duration,
    /// Maximum WebSocket upgrades allowed per peer inside the window.
    pub ws_rate_max: usize,
    /// Peer addresses rejected outright by the gatekeeper.
    pub blocked_ips: Vec<IpAddr>,
}

impl AppConfig {
    /// Load the configuration from environment variables, falling back to
    /// built-in defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let config = Self {
            port: env_parse("PORT", DEFAULT_PORT),
            mongo_uri: env::var("MONGO_URI").unwrap_or_else(|_| DEFAULT_MONGO_URI.into()),
            mongo_db: env::var("MONGO_DB").ok().filter(|value| !value.is_empty()),
            heartbeat_interval: Duration::from_secs(env_parse(
                "HEARTBEAT_INTERVAL_SECS",
                DEFAULT_HEARTBEAT_SECS,
            )),
            status_sync_interval: Duration::from_secs(env_parse(
                "STATUS_SYNC_INTERVAL_SECS",
                DEFAULT_STATUS_SYNC_SECS,
            )),
            max_frame_bytes: env_parse("WS_MAX_FRAME_BYTES", DEFAULT_MAX_FRAME_BYTES),
            rate_limiting_enabled: env_flag("RATE_LIMITING_ENABLED", true),
            http_rate_window: Duration::from_secs(env_parse(
                "HTTP_RATE_WINDOW_SECS",
                DEFAULT_HTTP_RATE_WINDOW_SECS,
            )),
            http_rate_max: env_parse("HTTP_RATE_MAX", DEFAULT_HTTP_RATE_MAX),
            ws_rate_window: Duration::from_secs(env_parse(
                "WS_RATE_WINDOW_SECS",
                DEFAULT_WS_RATE_WINDOW_SECS,
            )),
            ws_rate_max: env_parse("WS_RATE_MAX", DEFAULT_WS_RATE_MAX),
            blocked_ips: env_ip_list("BLOCKED_IPS"),
        };

        info!(
            port = config.port,
            heartbeat_secs = config.heartbeat_interval.as_secs(),
            status_sync_secs = config.status_sync_interval.as_secs(),
            rate_limiting = config.rate_limiting_enabled,
            "loaded configuration"
        );

        config
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            mongo_uri: DEFAULT_MONGO_URI.into(),
            mongo_db: None,
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_SECS),
            status_sync_interval: Duration::from_secs(DEFAULT_STATUS_SYNC_SECS),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            rate_limiting_enabled: true,
            http_rate_window: Duration::from_secs(DEFAULT_HTTP_RATE_WINDOW_SECS),
            http_rate_max: DEFAULT_HTTP_RATE_MAX,
            ws_rate_window: Duration::from_secs(DEFAULT_WS_RATE_WINDOW_SECS),
            ws_rate_max: DEFAULT_WS_RATE_MAX,
            blocked_ips: Vec::new(),
        }
    }
}

/// Parse an environment variable, logging and falling back on bad input.
fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparseable environment variable");
                default
            }
        },
        Err(_) => default,
    }
}

/// Interpret an environment variable as a boolean flag.
fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => !matches!(raw.trim(), "0" | "false" | "off" | "no"),
        Err(_) => default,
    }
}

/// Parse a comma-separated list of IP addresses, skipping invalid entries.
fn env_ip_list(key: &str) -> Vec<IpAddr> {
    let Ok(raw) = env::var(key) else {
        return Vec::new();
    };

    raw.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() {
                return None;
            }
            match entry.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    warn!(key, entry, "skipping unparseable blocked address");
                    None
                }
            }
        })
        .collect()
}
