//! Feed configuration.
//!
//! Every setting has a built-in default, so the relay runs with no config file
//! at all. An optional JSON file may override any subset of the fields.
//!
//! # Example config
//!
//! ```json
//! {
//!   "ws_url": "wss://stream.binance.com:9443/ws/ethusdt@trade",
//!   "shm_path": "/dev/shm/eth_price_shm",
//!   "pipe_path": "/tmp/eth_price_pipe",
//!   "step": 12.5,
//!   "max_backoff_secs": 60
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::TcError;

/// Upstream trade stream.
pub const DEFAULT_WS_URL: &str = "wss://stream.binance.com:9443/ws/ethusdt@trade";
/// Shared memory file, on a tmpfs so it never touches disk.
pub const DEFAULT_SHM_PATH: &str = "/dev/shm/eth_price_shm";
/// FIFO used as the wake-up channel.
pub const DEFAULT_PIPE_PATH: &str = "/tmp/eth_price_pipe";
/// Threshold magnitude for up/down alerts.
pub const DEFAULT_STEP: f64 = 12.5;
pub const DEFAULT_MIN_BACKOFF_SECS: u64 = 1;
pub const DEFAULT_MAX_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 20;
/// A session connected at least this long resets the reconnect backoff.
pub const DEFAULT_STABLE_SESSION_SECS: u64 = 60;

/// Runtime settings for the price relay.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// WebSocket endpoint streaming JSON trade frames.
    pub ws_url: String,
    /// Path of the file backing the shared price slot.
    pub shm_path: PathBuf,
    /// Path of the FIFO special file.
    pub pipe_path: PathBuf,
    /// Checkpoint rounding step and alert threshold.
    pub step: f64,
    pub min_backoff_secs: u64,
    pub max_backoff_secs: u64,
    pub ping_interval_secs: u64,
    pub stable_session_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            shm_path: PathBuf::from(DEFAULT_SHM_PATH),
            pipe_path: PathBuf::from(DEFAULT_PIPE_PATH),
            step: DEFAULT_STEP,
            min_backoff_secs: DEFAULT_MIN_BACKOFF_SECS,
            max_backoff_secs: DEFAULT_MAX_BACKOFF_SECS,
            ping_interval_secs: DEFAULT_PING_INTERVAL_SECS,
            stable_session_secs: DEFAULT_STABLE_SESSION_SECS,
        }
    }
}

impl FeedConfig {
    pub fn min_backoff(&self) -> Duration {
        Duration::from_secs(self.min_backoff_secs)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn stable_session(&self) -> Duration {
        Duration::from_secs(self.stable_session_secs)
    }

    /// Reject settings the relay cannot run with.
    pub fn validate(&self) -> Result<(), TcError> {
        let url = url::Url::parse(&self.ws_url)
            .map_err(|e| TcError::Config(format!("invalid ws_url '{}': {e}", self.ws_url)))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(TcError::Config(format!("ws_url must be ws:// or wss://, got '{}'", url.scheme())));
        }
        if !(self.step.is_finite() && self.step > 0.0) {
            return Err(TcError::Config(format!("step must be positive, got {}", self.step)));
        }
        if self.min_backoff_secs == 0 {
            return Err(TcError::Config("min_backoff_secs must be at least 1".into()));
        }
        if self.max_backoff_secs < self.min_backoff_secs {
            return Err(TcError::Config(format!(
                "max_backoff_secs ({}) is below min_backoff_secs ({})",
                self.max_backoff_secs, self.min_backoff_secs
            )));
        }
        if self.ping_interval_secs == 0 {
            return Err(TcError::Config("ping_interval_secs must be at least 1".into()));
        }
        Ok(())
    }
}

/// Load and validate a JSON config file.
pub fn load_config(path: &std::path::Path) -> anyhow::Result<FeedConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FeedConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_constants() {
        let cfg = FeedConfig::default();
        assert_eq!(cfg.ws_url, DEFAULT_WS_URL);
        assert_eq!(cfg.shm_path, PathBuf::from("/dev/shm/eth_price_shm"));
        assert_eq!(cfg.pipe_path, PathBuf::from("/tmp/eth_price_pipe"));
        assert_eq!(cfg.step, 12.5);
        assert_eq!(cfg.min_backoff(), Duration::from_secs(1));
        assert_eq!(cfg.max_backoff(), Duration::from_secs(60));
        assert_eq!(cfg.ping_interval(), Duration::from_secs(20));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: FeedConfig = serde_json::from_str(r#"{"step": 25.0, "pipe_path": "/tmp/other"}"#).unwrap();
        assert_eq!(cfg.step, 25.0);
        assert_eq!(cfg.pipe_path, PathBuf::from("/tmp/other"));
        assert_eq!(cfg.ws_url, DEFAULT_WS_URL);
        assert_eq!(cfg.max_backoff_secs, 60);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_scheme = FeedConfig { ws_url: "https://example.com".into(), ..Default::default() };
        assert!(bad_scheme.validate().is_err());

        let bad_step = FeedConfig { step: 0.0, ..Default::default() };
        assert!(bad_step.validate().is_err());

        let inverted = FeedConfig { min_backoff_secs: 10, max_backoff_secs: 5, ..Default::default() };
        assert!(inverted.validate().is_err());

        let no_ping = FeedConfig { ping_interval_secs: 0, ..Default::default() };
        assert!(no_ping.validate().is_err());
    }

    #[test]
    fn load_config_from_file() {
        let path = std::env::temp_dir().join(format!("tc_cfg_{}.json", std::process::id()));
        std::fs::write(&path, r#"{"max_backoff_secs": 30}"#).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.max_backoff(), Duration::from_secs(30));
        let _ = std::fs::remove_file(&path);
    }
}
