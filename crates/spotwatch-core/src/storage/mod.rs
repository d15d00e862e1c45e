mod config;

pub use config::{Config, MarketConfig, NotifierConfig, NotifierKindConfig, RefreshConfig, ThresholdsConfig};

use std::path::PathBuf;

/// Returns `~/.config/spotwatch[-dev]/` based on SPOTWATCH_ENV.
///
/// Set SPOTWATCH_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SPOTWATCH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("spotwatch-dev")
    } else {
        base_dir.join("spotwatch")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
