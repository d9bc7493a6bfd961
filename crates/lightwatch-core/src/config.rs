//! lightwatch.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of "is it stopped yet?" polls during a restart.
pub const DEFAULT_MAX_POLLS: u32 = 100;
/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Log files are rotated once they reach this size.
pub const DEFAULT_LOG_MAX_BYTES: u64 = 1024 * 1024;
/// Number of rotated log files kept.
pub const DEFAULT_LOG_BACKUPS: u32 = 1;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightwatchConfig {
    #[serde(default)]
    pub restart: RestartConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestartConfig {
    pub max_polls: Option<u32>,
    /// Poll interval, e.g. "3s" or "500ms".
    pub poll_interval: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub profile: Option<String>,
    /// Path to the `aws` executable.
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub file: Option<PathBuf>,
    pub max_bytes: Option<u64>,
    pub backups: Option<u32>,
}

impl LightwatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: LightwatchConfig = toml::from_str(content)?;
        // Surface a bad duration at load time rather than mid-restart.
        config.poll_interval()?;
        Ok(config)
    }

    pub fn max_polls(&self) -> u32 {
        self.restart.max_polls.unwrap_or(DEFAULT_MAX_POLLS)
    }

    pub fn poll_interval(&self) -> Result<Duration, ConfigError> {
        match &self.restart.poll_interval {
            None => Ok(DEFAULT_POLL_INTERVAL),
            Some(raw) => parse_duration(raw).ok_or_else(|| ConfigError::InvalidDuration {
                field: "restart.poll_interval",
                value: raw.clone(),
            }),
        }
    }

    pub fn log_max_bytes(&self) -> u64 {
        self.log.max_bytes.unwrap_or(DEFAULT_LOG_MAX_BYTES)
    }

    pub fn log_backups(&self) -> u32 {
        self.log.backups.unwrap_or(DEFAULT_LOG_BACKUPS)
    }
}

/// Parse a duration string like "3s", "500ms", "2m" or a bare number of
/// seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}
