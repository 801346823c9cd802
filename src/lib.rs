pub mod bridge;
pub mod error;
pub mod filter;
pub mod frame;
pub mod sink;
pub mod source;
pub mod transport;
pub mod wire;

use std::time::Duration;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

pub use error::BridgeError;
pub use frame::{Frame, FrameCaps, FrameMetadata, PixelFormat};

/// Global configuration that can be atomically swapped at runtime
pub static CONFIG: once_cell::sync::Lazy<ArcSwap<Config>> =
    once_cell::sync::Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// System configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transport: TransportConfig,
    pub source: SourceConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Transport url, interpreted by whichever transport is installed
    pub url: String,
    pub data_channel: String,
    pub snap_channel: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Longest a fill request waits for a frame
    pub timeout_ms: u64,
    /// Depth bound of the pending-frame queue; oldest dropped beyond it
    pub queue_max_depth: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    /// Republish period of the snapshot announcement thread
    pub period_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig {
                url: "ipc".into(),
                data_channel: "GSTREAMER_DATA".into(),
                snap_channel: "GSTREAMER_SNAP".into(),
            },
            source: SourceConfig {
                timeout_ms: 5000,
                queue_max_depth: 8,
            },
            snapshot: SnapshotConfig { period_ms: 100 },
        }
    }
}

impl Config {
    /// Load configuration from `hermes.toml` and `HERMES_*` environment
    /// variables layered over the defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name("hermes").required(false))
            .add_source(config::Environment::with_prefix("HERMES").separator("__"))
            .build()?
            .try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.source.timeout_ms)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.snapshot.period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_observed_behavior() {
        let config = Config::default();
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.period(), Duration::from_millis(100));
        assert_eq!(config.source.queue_max_depth, 8);
    }
}
