//! Configuration management for srtd.
//!
//! Loads settings from /etc/srt/config.toml or uses defaults.
//! Command-line flags override whatever is loaded here.

use crate::collector::Backend;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use srt_shared::window::parse_duration;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/srt/config.toml";

/// Default config file path for fallback
pub const DEFAULT_CONFIG_PATH: &str = "/var/lib/srt/config.toml";

/// Collection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Lookback window, e.g. "1h" or "30m"
    #[serde(default = "default_since")]
    pub since: String,

    /// Collector variant; "auto" follows the host platform
    #[serde(default)]
    pub backend: Backend,
}

fn default_since() -> String {
    "1h".to_string()
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            since: default_since(),
            backend: Backend::default(),
        }
    }
}

/// Polling cadence for `srtd poll`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between polls
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Per-poll time limit for the external log tool, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_interval() -> u64 {
    3
}

fn default_timeout() -> u64 {
    3
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Full srtd configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,

    #[serde(default)]
    pub poll: PollConfig,
}

impl Config {
    /// Load config from the system paths, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_PATH)
            .or_else(|_| Self::load_from_path(DEFAULT_CONFIG_PATH))
            .unwrap_or_else(|e| {
                warn!("Config not found, using defaults: {}", e);
                Config::default()
            })
    }

    /// Load and validate config from a specific path
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let since = self.since()?;
        if since.is_zero() {
            bail!("collector.since must be positive");
        }
        if self.poll.interval_secs == 0 {
            bail!("poll.interval_secs must be at least 1");
        }
        if self.poll.timeout_secs == 0 {
            bail!("poll.timeout_secs must be at least 1");
        }
        Ok(())
    }

    /// Parsed lookback window
    pub fn since(&self) -> Result<Duration> {
        parse_duration(&self.collector.since)
            .with_context(|| format!("invalid collector.since {:?}", self.collector.since))
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_extension_flags() {
        let config = Config::default();
        assert_eq!(config.since().unwrap(), Duration::from_secs(3600));
        assert_eq!(config.collector.backend, Backend::Auto);
        assert_eq!(config.poll.interval_secs, 3);
        assert_eq!(config.poll.timeout_secs, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[collector]\nsince = \"30m\"\n").unwrap();
        assert_eq!(config.since().unwrap(), Duration::from_secs(1800));
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let mut config = Config::default();
        config.collector.since = "0".to_string();
        assert!(config.validate().is_err());
        config.collector.since = "soon".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[collector]"));
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
