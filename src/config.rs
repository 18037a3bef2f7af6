//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;
use std::time::Duration;

/// Origins accepted when `CORS_ALLOWED_ORIGINS` is not set.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "localhost",
    "https://www.chessplay.live",
];

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Origins allowed for CORS and WebSocket upgrades.
    pub allowed_origins: Vec<String>,

    /// Capacity of each connection's outbound frame queue.
    pub outbound_queue_capacity: usize,

    /// Seconds before an unaccepted connection request expires (0 = never).
    pub handshake_timeout_secs: u64,

    /// Seconds between handshake expiry sweeps.
    pub handshake_sweep_interval_secs: u64,

    /// Largest accepted inbound WebSocket message, in bytes.
    pub max_frame_bytes: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| (*o).to_string())
                .collect(),
            outbound_queue_capacity: 256,
            handshake_timeout_secs: 30,
            handshake_sweep_interval_secs: 5,
            max_frame_bytes: 64 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let listen_addr: SocketAddr = match std::env::var("LISTEN_ADDR") {
            Ok(raw) => raw.parse()?,
            Err(_) => defaults.listen_addr,
        };

        let allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.allowed_origins);

        let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            listen_addr,
            allowed_origins,
            outbound_queue_capacity: parse_env(
                "OUTBOUND_QUEUE_CAPACITY",
                defaults.outbound_queue_capacity,
            ),
            handshake_timeout_secs: parse_env(
                "HANDSHAKE_TIMEOUT_SECS",
                defaults.handshake_timeout_secs,
            ),
            handshake_sweep_interval_secs: parse_env(
                "HANDSHAKE_SWEEP_INTERVAL_SECS",
                defaults.handshake_sweep_interval_secs,
            ),
            max_frame_bytes: parse_env("MAX_FRAME_BYTES", defaults.max_frame_bytes),
            log_format,
        })
    }

    /// Handshake timeout, or `None` when disabled.
    #[must_use]
    pub fn handshake_timeout(&self) -> Option<Duration> {
        (self.handshake_timeout_secs > 0).then(|| Duration::from_secs(self.handshake_timeout_secs))
    }

    /// Period of the handshake expiry sweep.
    #[must_use]
    pub fn handshake_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.handshake_sweep_interval_secs.max(1))
    }

    /// Returns `true` if `origin` is in the allow-list.
    #[must_use]
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Splits a comma-separated list, trimming entries and dropping empties.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_local_and_production_origins() {
        let config = RelayConfig::default();
        assert!(config.is_origin_allowed("http://localhost:3000"));
        assert!(config.is_origin_allowed("localhost"));
        assert!(config.is_origin_allowed("https://www.chessplay.live"));
        assert!(!config.is_origin_allowed("https://example.com"));
    }

    #[test]
    fn zero_timeout_disables_expiry() {
        let config = RelayConfig {
            handshake_timeout_secs: 0,
            ..RelayConfig::default()
        };
        assert!(config.handshake_timeout().is_none());
        assert_eq!(
            RelayConfig::default().handshake_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn sweep_interval_is_at_least_one_second() {
        let config = RelayConfig {
            handshake_sweep_interval_secs: 0,
            ..RelayConfig::default()
        };
        assert_eq!(config.handshake_sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn parse_list_trims_and_skips_empty() {
        assert_eq!(
            parse_list(" http://a.test , ,https://b.test,"),
            vec!["http://a.test".to_string(), "https://b.test".to_string()]
        );
    }
}
