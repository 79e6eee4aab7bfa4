//! TOML-based application configuration.
//!
//! Stores:
//! - The usable day window and sleep window
//! - Grid step and layout scale
//! - Persistence retry policy
//! - Log level
//!
//! Configuration is stored at `~/.config/dayweave/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::clock;
use crate::drag::DragConfig;
use crate::error::{ConfigError, CoreError};
use crate::layout::LayoutConfig;
use crate::planner::MergeSettings;
use crate::repository::RetryPolicy;
use crate::scheduler::AssignerConfig;
use crate::timeline::{DayWindow, SleepWindow};

/// Day window and free-slot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayConfig {
    #[serde(default = "default_day_start")]
    pub day_start: String,
    #[serde(default = "default_day_end")]
    pub day_end: String,
    #[serde(default = "default_sleep_start")]
    pub sleep_start: String,
    #[serde(default = "default_sleep_end")]
    pub sleep_end: String,
    #[serde(default = "default_true")]
    pub sleep_enabled: bool,
    #[serde(default = "default_min_slot")]
    pub min_slot_minutes: u32,
}

/// Timeline layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSection {
    #[serde(default = "default_grid_step")]
    pub grid_step: u32,
    #[serde(default = "default_min_visual_height")]
    pub min_visual_height: u32,
    #[serde(default = "default_pixels_per_minute")]
    pub pixels_per_minute: f64,
    #[serde(default = "default_drag_threshold")]
    pub drag_threshold_px: f64,
}

/// Remote call policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub day: DayConfig,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_day_start() -> String {
    "00:00".into()
}
fn default_day_end() -> String {
    "24:00".into()
}
fn default_sleep_start() -> String {
    "23:00".into()
}
fn default_sleep_end() -> String {
    "07:00".into()
}
fn default_true() -> bool {
    true
}
fn default_min_slot() -> u32 {
    crate::timeline::DEFAULT_MIN_SLOT_MINUTES
}
fn default_grid_step() -> u32 {
    15
}
fn default_min_visual_height() -> u32 {
    20
}
fn default_pixels_per_minute() -> f64 {
    1.0
}
fn default_drag_threshold() -> f64 {
    5.0
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_attempts() -> u32 {
    2
}
fn default_backoff_ms() -> u64 {
    250
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for DayConfig {
    fn default() -> Self {
        Self {
            day_start: default_day_start(),
            day_end: default_day_end(),
            sleep_start: default_sleep_start(),
            sleep_end: default_sleep_end(),
            sleep_enabled: true,
            min_slot_minutes: default_min_slot(),
        }
    }
}

impl Default for LayoutSection {
    fn default() -> Self {
        Self {
            grid_step: default_grid_step(),
            min_visual_height: default_min_visual_height(),
            pixels_per_minute: default_pixels_per_minute(),
            drag_threshold_px: default_drag_threshold(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;

            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => {
                    if let Ok(n) = value.parse::<u64>() {
                        serde_json::Value::Number(n.into())
                    } else if let Ok(n) = value.parse::<f64>() {
                        serde_json::Number::from_f64(n)
                            .map(serde_json::Value::Number)
                            .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                    } else {
                        return Err(invalid(format!("cannot parse '{value}' as number")));
                    }
                }
                serde_json::Value::Object(_) => return Err(unknown()),
                _ => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `config.toml` inside the data directory.
    pub fn path() -> Result<PathBuf, CoreError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default config on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, CoreError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), CoreError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CoreError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
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

    /// Set a value by dot-separated key, without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting config does not validate.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Flattened `key = value` pairs, sorted by key.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out.sort();
        out
    }

    /// Check that every value converts into engine settings.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.merge_settings()?;
        self.layout_config()?;
        self.drag_config()?;
        self.retry_policy()?;
        Ok(())
    }

    pub fn merge_settings(&self) -> Result<MergeSettings, CoreError> {
        let window = DayWindow::new(
            clock::parse_hhmm(&self.day.day_start)?,
            clock::parse_hhmm(&self.day.day_end)?,
        )?;
        let sleep = if self.day.sleep_enabled {
            Some(SleepWindow::from_hhmm(&self.day.sleep_start, &self.day.sleep_end)?)
        } else {
            None
        };
        Ok(MergeSettings {
            window,
            sleep,
            min_slot_minutes: self.day.min_slot_minutes,
        })
    }

    pub fn assigner_config(&self) -> AssignerConfig {
        AssignerConfig {
            min_slot_minutes: self.day.min_slot_minutes,
            grid_step: self.layout.grid_step,
            ..AssignerConfig::default()
        }
    }

    pub fn layout_config(&self) -> Result<LayoutConfig, ConfigError> {
        self.check_grid_step()?;
        check_positive("layout.pixels_per_minute", self.layout.pixels_per_minute)?;
        Ok(LayoutConfig {
            min_visual_height: self.layout.min_visual_height,
            grid_step: self.layout.grid_step,
            pixels_per_minute: self.layout.pixels_per_minute,
        })
    }

    pub fn drag_config(&self) -> Result<DragConfig, ConfigError> {
        self.check_grid_step()?;
        check_positive("layout.pixels_per_minute", self.layout.pixels_per_minute)?;
        if !self.layout.drag_threshold_px.is_finite() || self.layout.drag_threshold_px < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "layout.drag_threshold_px".into(),
                message: "must be a non-negative number".into(),
            });
        }
        Ok(DragConfig {
            threshold_px: self.layout.drag_threshold_px,
            grid_step: self.layout.grid_step,
            pixels_per_minute: self.layout.pixels_per_minute,
        })
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        if self.persistence.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "persistence.max_attempts".into(),
                message: "must be at least 1".into(),
            });
        }
        Ok(RetryPolicy {
            max_attempts: self.persistence.max_attempts,
            timeout: Duration::from_secs(self.persistence.timeout_secs),
            backoff: Duration::from_millis(self.persistence.backoff_ms),
        })
    }

    fn check_grid_step(&self) -> Result<(), ConfigError> {
        if self.layout.grid_step == 0 || self.layout.grid_step > clock::DAY_MINUTES {
            return Err(ConfigError::InvalidValue {
                key: "layout.grid_step".into(),
                message: "must be between 1 and 1440".into(),
            });
        }
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

fn check_positive(key: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be a positive number".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.day.sleep_start, "23:00");
        assert_eq!(parsed.layout.grid_step, 15);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[day]\nsleep_enabled = false\n").unwrap();
        assert!(!parsed.day.sleep_enabled);
        assert_eq!(parsed.day.min_slot_minutes, 15);
        assert_eq!(parsed.persistence.max_attempts, 2);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("day.sleep_end").as_deref(), Some("07:00"));
        assert_eq!(cfg.get("layout.grid_step").as_deref(), Some("15"));
        assert_eq!(cfg.get("day.sleep_enabled").as_deref(), Some("true"));
        assert!(cfg.get("day.nope").is_none());
    }

    #[test]
    fn set_updates_typed_values() {
        let mut cfg = Config::default();
        cfg.set("layout.grid_step", "30").unwrap();
        cfg.set("day.sleep_enabled", "false").unwrap();
        cfg.set("layout.pixels_per_minute", "1.5").unwrap();
        cfg.set("day.sleep_start", "22:30").unwrap();
        assert_eq!(cfg.layout.grid_step, 30);
        assert!(!cfg.day.sleep_enabled);
        assert_eq!(cfg.layout.pixels_per_minute, 1.5);
        assert_eq!(cfg.day.sleep_start, "22:30");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("day.bedtime", "22:00"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
        assert!(matches!(
            cfg.set("day", "x"),
            Err(CoreError::Config(ConfigError::UnknownKey(_)))
        ));
    }

    #[test]
    fn set_rejects_invalid_values() {
        let mut cfg = Config::default();
        assert!(cfg.set("layout.grid_step", "abc").is_err());
        assert!(cfg.set("layout.grid_step", "0").is_err());
        assert!(cfg.set("day.sleep_start", "25:00").is_err());
        assert!(cfg.set("day.sleep_end", "23:00").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn entries_are_flat_and_sorted() {
        let entries = Config::default().entries();
        assert!(entries.contains(&("logging.level".to_string(), "warn".to_string())));
        assert!(entries.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn converts_into_engine_settings() {
        let cfg = Config::default();
        let merge = cfg.merge_settings().unwrap();
        assert_eq!(merge.window, DayWindow::default());
        assert_eq!(merge.sleep, Some(SleepWindow::default()));
        assert_eq!(cfg.retry_policy().unwrap(), RetryPolicy::default());
        assert_eq!(cfg.layout_config().unwrap(), LayoutConfig::default());
        assert_eq!(cfg.drag_config().unwrap(), DragConfig::default());
    }

    #[test]
    fn load_from_writes_default_then_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.set("day.min_slot_minutes", "30").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().day.min_slot_minutes, 30);
    }

    #[test]
    fn load_from_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[day\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(CoreError::Config(ConfigError::LoadFailed { .. }))
        ));
    }
}
