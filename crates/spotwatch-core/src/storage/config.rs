//! TOML-based application configuration.
//!
//! Stores:
//! - Market settings (delivery area, currency, timezone, VAT)
//! - Price thresholds and run-length caps
//! - Notifier selection and credentials
//! - Daily refresh time
//!
//! Configuration is stored at `~/.config/spotwatch/config.toml`.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::events::ClosurePolicy;
use crate::notifier::DEFAULT_IFTTT_URL;
use crate::pricing::Thresholds;
use crate::provider::DEFAULT_API_URL;

/// Market-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    #[serde(default = "default_area")]
    pub area: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// IANA timezone used for local times and for deciding "today".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub vat_percent: Option<f64>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

/// Threshold configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    #[serde(default = "default_low")]
    pub low: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_max_low_hours")]
    pub max_low_hours: usize,
    #[serde(default = "default_max_high_hours")]
    pub max_high_hours: usize,
    /// Bound the run still open at the end of the day like any other run.
    #[serde(default)]
    pub bound_end_of_day: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKindConfig {
    Ifttt,
    Log,
}

/// Notifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default = "default_notifier_kind")]
    pub kind: NotifierKindConfig,
    #[serde(default)]
    pub ifttt_key: String,
    #[serde(default = "default_ifttt_url")]
    pub ifttt_url: String,
}

/// Daily refresh time, in UTC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_refresh_hour")]
    pub hour_utc: u32,
    #[serde(default)]
    pub minute: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/spotwatch/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
}

// Default functions
fn default_area() -> String {
    "FI".into()
}
fn default_currency() -> String {
    "EUR".into()
}
fn default_timezone() -> String {
    "Europe/Helsinki".into()
}
fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}
fn default_low() -> f64 {
    20.0
}
fn default_high() -> f64 {
    100.0
}
fn default_max_low_hours() -> usize {
    4
}
fn default_max_high_hours() -> usize {
    3
}
fn default_notifier_kind() -> NotifierKindConfig {
    NotifierKindConfig::Log
}
fn default_ifttt_url() -> String {
    DEFAULT_IFTTT_URL.into()
}
fn default_refresh_hour() -> u32 {
    // Day-ahead prices are published shortly before 13:00 CET.
    13
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            area: default_area(),
            currency: default_currency(),
            timezone: default_timezone(),
            vat_percent: None,
            api_url: default_api_url(),
        }
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            low: default_low(),
            high: default_high(),
            max_low_hours: default_max_low_hours(),
            max_high_hours: default_max_high_hours(),
            bound_end_of_day: false,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: default_notifier_kind(),
            ifttt_key: String::new(),
            ifttt_url: default_ifttt_url(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            hour_utc: default_refresh_hour(),
            minute: 0,
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
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|e| ConfigError::invalid(key, e.to_string()))?,
                    // Optional numbers serialize as null; "none" clears them.
                    serde_json::Value::Number(_) | serde_json::Value::Null => {
                        if value.eq_ignore_ascii_case("none") {
                            serde_json::Value::Null
                        } else {
                            parse_number(key, value)?
                        }
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("~/.config/spotwatch"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Path of the default configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration directory cannot be created.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        Self::path()
    }

    /// Load from the default location, writing defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// default config cannot be written.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
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

    /// Set a config value by key in memory. The result is validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check values that deserialize fine but cannot drive a run.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        if t.max_low_hours == 0 {
            return Err(ConfigError::invalid("thresholds.max_low_hours", "must be at least 1"));
        }
        if t.max_high_hours == 0 {
            return Err(ConfigError::invalid("thresholds.max_high_hours", "must be at least 1"));
        }
        if !t.low.is_finite() || !t.high.is_finite() {
            return Err(ConfigError::invalid("thresholds", "thresholds must be finite"));
        }
        if t.low > t.high {
            return Err(ConfigError::invalid(
                "thresholds.low",
                format!("low ({}) must not exceed high ({})", t.low, t.high),
            ));
        }
        if let Some(vat) = self.market.vat_percent {
            if !vat.is_finite() || vat <= -100.0 {
                return Err(ConfigError::invalid("market.vat_percent", "must be above -100"));
            }
        }
        self.timezone()?;
        if self.refresh.hour_utc > 23 {
            return Err(ConfigError::invalid("refresh.hour_utc", "must be 0-23"));
        }
        if self.refresh.minute > 59 {
            return Err(ConfigError::invalid("refresh.minute", "must be 0-59"));
        }
        if self.notifier.kind == NotifierKindConfig::Ifttt && self.notifier.ifttt_key.is_empty() {
            return Err(ConfigError::invalid(
                "notifier.ifttt_key",
                "required when notifier.kind is ifttt",
            ));
        }
        Ok(())
    }

    /// Parsed target timezone.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is not a known IANA timezone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        Tz::from_str(&self.market.timezone)
            .map_err(|e| ConfigError::invalid("market.timezone", e.to_string()))
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            low_threshold: self.thresholds.low,
            high_threshold: self.thresholds.high,
            max_low_run: self.thresholds.max_low_hours,
            max_high_run: self.thresholds.max_high_hours,
            tax_percent: self.market.vat_percent,
        }
    }

    pub fn closure_policy(&self) -> ClosurePolicy {
        if self.thresholds.bound_end_of_day {
            ClosurePolicy::Bounded
        } else {
            ClosurePolicy::Unbounded
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<serde_json::Value, ConfigError> {
    if let Ok(n) = value.parse::<u64>() {
        return Ok(serde_json::Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .ok_or_else(|| ConfigError::invalid(key, format!("cannot parse '{value}' as number")))
}
