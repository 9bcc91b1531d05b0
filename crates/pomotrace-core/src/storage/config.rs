//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Per-type session durations
//! - Timer behavior (long-break cadence, auto-start)
//! - Usage tracking cadence and failure handling
//!
//! Configuration is stored at `~/.config/pomotrace/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::session::SessionType;

/// Session durations, in minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_work_min")]
    pub work: u32,
    #[serde(default = "default_short_break_min")]
    pub short_break: u32,
    #[serde(default = "default_long_break_min")]
    pub long_break: u32,
}

impl DurationsConfig {
    /// Configured duration for `kind`, in seconds.
    pub fn planned_secs(&self, kind: SessionType) -> u64 {
        let minutes = match kind {
            SessionType::Work => self.work,
            SessionType::ShortBreak => self.short_break,
            SessionType::LongBreak => self.long_break,
        };
        u64::from(minutes).saturating_mul(60)
    }
}

/// Timer behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Completed work rounds between long breaks.
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    /// Daily work-round goal, surfaced in snapshots.
    #[serde(default = "default_target_rounds")]
    pub target_rounds: u32,
    #[serde(default)]
    pub auto_start_breaks: bool,
    #[serde(default)]
    pub auto_start_work: bool,
}

/// Usage tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Seconds between foreground samples.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Consecutive probe failures tolerated before sampling self-suspends.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Delay after suspension until the error counter clears.
    #[serde(default = "default_error_reset_secs")]
    pub error_reset_secs: u64,
    /// Maximum checkpoint age eligible for restart recovery.
    #[serde(default = "default_resume_window_secs")]
    pub resume_window_secs: u64,
    /// Minutes of uninterrupted work before a host may flag hyperfocus.
    /// Stored and surfaced only; the engine does not interpret it.
    #[serde(default = "default_hyperfocus_threshold_min")]
    pub hyperfocus_threshold_min: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomotrace/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationsConfig,
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
}

// Default functions
fn default_work_min() -> u32 {
    25
}
fn default_short_break_min() -> u32 {
    5
}
fn default_long_break_min() -> u32 {
    15
}
fn default_long_break_interval() -> u32 {
    4
}
fn default_target_rounds() -> u32 {
    8
}
fn default_interval_secs() -> u64 {
    5
}
fn default_max_consecutive_errors() -> u32 {
    10
}
fn default_error_reset_secs() -> u64 {
    300
}
fn default_resume_window_secs() -> u64 {
    3600
}
fn default_hyperfocus_threshold_min() -> u32 {
    90
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            work: default_work_min(),
            short_break: default_short_break_min(),
            long_break: default_long_break_min(),
        }
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            long_break_interval: default_long_break_interval(),
            target_rounds: default_target_rounds(),
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            max_consecutive_errors: default_max_consecutive_errors(),
            error_reset_secs: default_error_reset_secs(),
            resume_window_secs: default_resume_window_secs(),
            hyperfocus_threshold_min: default_hyperfocus_threshold_min(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| ConfigError::InvalidValue {
                                    key: key.to_string(),
                                    message: format!("cannot parse '{value}' as number"),
                                })?
                        } else {
                            return Err(ConfigError::InvalidValue {
                                key: key.to_string(),
                                message: format!("cannot parse '{value}' as number"),
                            });
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| ConfigError::InvalidValue {
                            key: key.to_string(),
                            message: e.to_string(),
                        })?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default file on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        self.save()?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
