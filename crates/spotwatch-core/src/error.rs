//! Core error types for spotwatch-core.
//!
//! This module defines the error hierarchy using thiserror. Classification,
//! streak bounding and event derivation are total and never fail; errors
//! only come from the edges: the price provider, the notifier and the
//! configuration file.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for spotwatch-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Price provider failed to return hourly data
    #[error("Price provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Notifier failed to deliver a fired trigger
    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Errors raised while acquiring a day of hourly prices.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure talking to the provider
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Prices for the requested day are not published yet
    #[error("prices for {date} are not published yet")]
    NotPublished { date: chrono::NaiveDate },

    /// Provider answered but delivered no hours
    #[error("no hourly prices returned for {date}")]
    Empty { date: chrono::NaiveDate },

    /// Payload could not be interpreted
    #[error("malformed price data: {0}")]
    Malformed(String),

    /// Local price file could not be read
    #[error("failed to read price file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by a notifier when a trigger fires.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Transport-level failure talking to the endpoint
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint rejected the notification
    #[error("endpoint returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Notifier is missing credentials or an endpoint
    #[error("notifier not configured: {0}")]
    NotConfigured(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Dot-path key does not name a configuration field
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_converts_into_core_error() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let err: CoreError = ProviderError::NotPublished { date }.into();
        assert!(matches!(err, CoreError::Provider(ProviderError::NotPublished { .. })));
        assert_eq!(
            err.to_string(),
            "Price provider error: prices for 2024-03-01 are not published yet"
        );
    }

    #[test]
    fn invalid_value_names_the_key() {
        let err = ConfigError::invalid("thresholds.max_high_hours", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'thresholds.max_high_hours': must be at least 1"
        );
    }
}
