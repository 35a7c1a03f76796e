//! Configuration management for Pumpwatch
//!
//! This module handles loading, validation, and management of the run
//! configuration from YAML files. Every section has defaults, so a partial
//! file (or no file at all) yields a usable configuration.

use crate::error::{PumpwatchError, Result};
use crate::model::Coordinate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coordinates swept in order, one collection run each
    pub coordinates: Vec<Coordinate>,

    /// Per-station retry behaviour
    pub fetch: FetchConfig,

    /// Request pacing towards the provider
    pub pacing: PacingConfig,

    /// Dataset locations
    pub output: OutputConfig,

    /// Remote provider connection settings
    pub provider: ProviderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Hour windows used to tag rows when cleaning a dataset
    pub time_tags: Vec<TimeTagConfig>,

    /// IANA timezone used to stamp query times; local time when unset
    pub timezone: Option<String>,
}

/// Retry policy for a single station price lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Attempts per station before giving up on rate limits
    pub max_retries: u32,

    /// First backoff wait in seconds; doubles on every retry
    pub backoff_base_secs: f64,
}

/// Pacing delays in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// Wait between two coordinates
    pub coordinate_cooldown_secs: f64,

    /// Wait between dispatching two station fetches
    pub station_spacing_secs: f64,

    /// Wait after a location search before fetching prices
    pub discovery_settle_secs: f64,
}

/// Dataset file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Append-only raw dataset
    pub dataset_path: PathBuf,

    /// Output of the cleaning step
    pub cleaned_path: PathBuf,
}

/// Provider connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// GraphQL endpoint
    pub endpoint: String,

    /// Per-request timeout enforced by the HTTP client
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Directory (or file path whose parent is used) for rolling log files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// One half-open hour window `[start_hour, end_hour)` mapped to a tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTagConfig {
    pub tag: String,
    pub start_hour: u32,
    pub end_hour: u32,
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_default()
}

impl FetchConfig {
    pub fn backoff_base(&self) -> Duration {
        secs(self.backoff_base_secs)
    }
}

impl PacingConfig {
    pub fn coordinate_cooldown(&self) -> Duration {
        secs(self.coordinate_cooldown_secs)
    }

    pub fn station_spacing(&self) -> Duration {
        secs(self.station_spacing_secs)
    }

    pub fn discovery_settle(&self) -> Duration {
        secs(self.discovery_settle_secs)
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = ["pumpwatch.yaml", "/etc/pumpwatch/config.yaml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Resolve the configured timezone, `None` meaning local time
    pub fn timezone(&self) -> Result<Option<chrono_tz::Tz>> {
        match self.timezone.as_deref() {
            None => Ok(None),
            Some(name) => name.parse::<chrono_tz::Tz>().map(Some).map_err(|_| {
                PumpwatchError::validation(
                    "timezone",
                    format!("Unknown timezone: {}", name).as_str(),
                )
            }),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.coordinates.is_empty() {
            return Err(PumpwatchError::validation(
                "coordinates",
                "At least one coordinate is required",
            ));
        }

        for (idx, c) in self.coordinates.iter().enumerate() {
            if !(-90.0..=90.0).contains(&c.latitude) {
                return Err(PumpwatchError::validation(
                    format!("coordinates[{}].latitude", idx),
                    "Must be within [-90, 90]".to_string(),
                ));
            }
            if !(-180.0..=180.0).contains(&c.longitude) {
                return Err(PumpwatchError::validation(
                    format!("coordinates[{}].longitude", idx),
                    "Must be within [-180, 180]".to_string(),
                ));
            }
        }

        if self.fetch.max_retries == 0 {
            return Err(PumpwatchError::validation(
                "fetch.max_retries",
                "Must be greater than 0",
            ));
        }

        let delays = [
            ("fetch.backoff_base_secs", self.fetch.backoff_base_secs),
            (
                "pacing.coordinate_cooldown_secs",
                self.pacing.coordinate_cooldown_secs,
            ),
            (
                "pacing.station_spacing_secs",
                self.pacing.station_spacing_secs,
            ),
            (
                "pacing.discovery_settle_secs",
                self.pacing.discovery_settle_secs,
            ),
        ];
        for (field, value) in delays {
            if !value.is_finite() || value < 0.0 {
                return Err(PumpwatchError::validation(
                    field,
                    "Must be a non-negative number of seconds",
                ));
            }
        }

        if self.output.dataset_path.as_os_str().is_empty() {
            return Err(PumpwatchError::validation(
                "output.dataset_path",
                "Path cannot be empty",
            ));
        }

        crate::logging::level::parse_log_level(&self.logging.level)?;

        for window in &self.time_tags {
            if window.start_hour >= window.end_hour || window.end_hour > 24 {
                return Err(PumpwatchError::validation(
                    format!("time_tags.{}", window.tag),
                    format!(
                        "Invalid hour window {}..{}",
                        window.start_hour, window.end_hour
                    ),
                ));
            }
        }

        self.timezone()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.coordinates.len(), 4);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.backoff_base(), Duration::from_secs(1));
        assert_eq!(config.pacing.coordinate_cooldown(), Duration::from_secs(60));
        assert_eq!(config.pacing.station_spacing(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.coordinates.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.coordinates[0].latitude = 91.0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.fetch.max_retries = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.pacing.station_spacing_secs = -1.0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.timezone = Some("Mars/Olympus".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "fetch:\n  max_retries: 3\ncoordinates:\n  - latitude: 1.5\n    longitude: 2.5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.fetch.max_retries, 3);
        assert!((config.fetch.backoff_base_secs - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.coordinates, vec![Coordinate::new(1.5, 2.5)]);
        assert!((config.pacing.coordinate_cooldown_secs - 60.0).abs() < f64::EPSILON);
    }
}
