//! Price provider backed by a local JSON file.

use std::path::PathBuf;

use chrono::NaiveDate;

use super::{to_hourly, PriceProvider};
use crate::error::ProviderError;
use crate::pricing::RawHour;

/// Reads a JSON array of `{ "start": ..., "price": ... }` records.
///
/// The file is expected to hold exactly one delivery day; the requested
/// date is only used in error messages.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PriceProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<RawHour>, ProviderError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProviderError::Io {
                path: self.path.clone(),
                source,
            })?;
        let records: Vec<RawHour> =
            serde_json::from_str(&content).map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let hours = to_hourly(records)?;
        if hours.is_empty() {
            return Err(ProviderError::Empty { date });
        }
        Ok(hours)
    }
}
