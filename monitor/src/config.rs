//! Configuration management for the Pulse monitor
//!
//! This module handles loading, parsing, and validating monitor configuration
//! from TOML files and environment variables. Values are plain data handed to
//! the monitor at construction; only thresholds can change afterwards.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::Threshold;

/// Main configuration structure for the monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Background sampler configuration
    pub sampling: SamplingConfig,

    /// Series storage configuration
    pub storage: StorageConfig,

    /// Statistics cache configuration
    pub stats: StatsConfig,

    /// Alert threshold overrides
    pub alerts: AlertsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Run the host resource sampler
    pub enabled: bool,

    /// Seconds between sampler ticks
    pub interval_secs: u64,

    /// Volume to report disk usage for; the root volume when unset
    pub disk_mount_point: Option<PathBuf>,
}

/// Series storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Maximum readings kept per metric
    pub capacity: usize,

    /// Maximum age of a reading in hours
    pub retention_hours: u64,
}

/// Statistics cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Seconds a computed summary stays valid
    pub cache_freshness_secs: u64,
}

/// Alert configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Per-metric thresholds layered over the built-in defaults
    pub thresholds: HashMap<String, Threshold>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Emit JSON formatted logs
    pub json: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5,
            disk_mount_point: None,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity: 1000,
            retention_hours: 24,
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            cache_freshness_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.to_string_lossy().to_string() })?;

        let config: MonitorConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError { reason: e.to_string() })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = MonitorConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback order: file -> env -> defaults
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let mut config = MonitorConfig::default();

        if let Some(path) = config_path {
            if path.as_ref().exists() {
                config = MonitorConfig::from_file(path)?;
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PULSE_*` overrides resolved through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("PULSE_SAMPLING_INTERVAL_SECS") {
            self.sampling.interval_secs = parse_field("PULSE_SAMPLING_INTERVAL_SECS", value)?;
        }

        if let Some(value) = lookup("PULSE_SAMPLING_ENABLED") {
            self.sampling.enabled = parse_field("PULSE_SAMPLING_ENABLED", value)?;
        }

        if let Some(value) = lookup("PULSE_RETENTION_HOURS") {
            self.storage.retention_hours = parse_field("PULSE_RETENTION_HOURS", value)?;
        }

        if let Some(value) = lookup("PULSE_CAPACITY") {
            self.storage.capacity = parse_field("PULSE_CAPACITY", value)?;
        }

        if let Some(value) = lookup("PULSE_CACHE_FRESHNESS_SECS") {
            self.stats.cache_freshness_secs = parse_field("PULSE_CACHE_FRESHNESS_SECS", value)?;
        }

        if let Some(level) = lookup("PULSE_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sampling.interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sampling.interval_secs".to_string(),
                value: "0".to_string(),
            });
        }

        if self.storage.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.storage.retention_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "storage.retention_hours".to_string(),
                value: "0".to_string(),
            });
        }

        // chrono durations are bounded; keep the window representable
        if self.storage.retention_hours > i32::MAX as u64 {
            return Err(ConfigError::InvalidValue {
                field: "storage.retention_hours".to_string(),
                value: self.storage.retention_hours.to_string(),
            });
        }

        if self.stats.cache_freshness_secs > i32::MAX as u64 {
            return Err(ConfigError::InvalidValue {
                field: "stats.cache_freshness_secs".to_string(),
                value: self.stats.cache_freshness_secs.to_string(),
            });
        }

        for (name, threshold) in &self.alerts.thresholds {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationFailed {
                    reason: "alert threshold with empty metric name".to_string(),
                });
            }
            if !threshold.warning.is_finite() || !threshold.critical.is_finite() {
                return Err(ConfigError::InvalidValue {
                    field: format!("alerts.thresholds.{}", name),
                    value: format!("{}/{}", threshold.warning, threshold.critical),
                });
            }
        }

        Ok(())
    }

    /// Time between sampler ticks
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(self.sampling.interval_secs)
    }

    /// Maximum age of a retained reading
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.storage.retention_hours as i64)
    }

    /// Lifetime of a cached stats entry
    pub fn cache_freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.stats.cache_freshness_secs as i64)
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("pulse").join("monitor.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ValidationFailed { reason: e.to_string() })?;

        fs::write(path, content)
            .map_err(|_| ConfigError::PermissionDenied { path: path.to_string_lossy().to_string() })?;

        Ok(())
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, value: String) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value,
    })
}
