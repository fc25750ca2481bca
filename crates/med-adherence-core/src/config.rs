//! Tracker configuration.
//!
//! Loaded from TOML, then optionally overridden from `MEDTRACK_*` environment
//! variables:
//!
//! ```toml
//! database_path = "/var/lib/medtrack/tracker.db"
//! utc_offset_minutes = -300
//! max_future_skew_secs = 900
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::ReferenceZone;

pub const ENV_DATABASE_PATH: &str = "MEDTRACK_DATABASE_PATH";
pub const ENV_UTC_OFFSET_MINUTES: &str = "MEDTRACK_UTC_OFFSET_MINUTES";
pub const ENV_MAX_FUTURE_SKEW_SECS: &str = "MEDTRACK_MAX_FUTURE_SKEW_SECS";

/// Upper bound for `max_future_skew_secs` (one leap year).
pub const MAX_FUTURE_SKEW_SECS: i64 = 366 * 86_400;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// SQLite file; in-memory when absent
    pub database_path: Option<PathBuf>,
    /// Reference timezone for calendar days, in minutes east of UTC
    pub utc_offset_minutes: i32,
    /// Reject dose logs asserted further than this ahead of the service clock
    pub max_future_skew_secs: Option<i64>,
}

impl TrackerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw)?;
        let config = config.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup. Unparsable values are
    /// logged and skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(path) = lookup(ENV_DATABASE_PATH).filter(|p| !p.is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(offset) = parse_override(&lookup, ENV_UTC_OFFSET_MINUTES) {
            self.utc_offset_minutes = offset;
        }
        if let Some(skew) = parse_override(&lookup, ENV_MAX_FUTURE_SKEW_SECS) {
            self.max_future_skew_secs = Some(skew);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if ReferenceZone::from_offset_minutes(self.utc_offset_minutes).is_none() {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes must be within ±1439, got {}",
                self.utc_offset_minutes
            )));
        }
        if let Some(skew) = self.max_future_skew_secs {
            if !(0..=MAX_FUTURE_SKEW_SECS).contains(&skew) {
                return Err(ConfigError::Invalid(format!(
                    "max_future_skew_secs must be within 0..={}, got {}",
                    MAX_FUTURE_SKEW_SECS, skew
                )));
            }
        }
        Ok(())
    }

    /// Reference zone for this config. Falls back to UTC for an out-of-range offset.
    pub fn reference_zone(&self) -> ReferenceZone {
        ReferenceZone::from_offset_minutes(self.utc_offset_minutes).unwrap_or_default()
    }

    pub fn max_future_skew(&self) -> Option<chrono::Duration> {
        self.max_future_skew_secs
            .and_then(chrono::Duration::try_seconds)
    }
}

fn parse_override<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", raw, key, e);
            None
        }
    }
}
