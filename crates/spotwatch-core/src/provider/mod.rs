//! Price providers.
//!
//! A provider hands back one delivery day of hourly prices, ordered by
//! time, in currency/MWh. Anything less than a usable day is an error: the
//! refresh is aborted rather than deriving events from partial data.

mod file;
mod nordpool;

pub use file::JsonFileProvider;
pub use nordpool::{NordPoolProvider, DEFAULT_API_URL};

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, DurationRound, NaiveDate, TimeDelta, Utc};

use crate::error::ProviderError;
use crate::pricing::RawHour;

/// Source of hourly day-ahead prices.
pub trait PriceProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetch the hourly prices for one delivery day.
    fn fetch_day(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Vec<RawHour>, ProviderError>> + Send;
}

/// Average records sharing an hour into one hourly record, sorted by time.
///
/// Day-ahead markets may publish at sub-hour resolution; the pipeline works
/// on whole hours.
pub fn to_hourly(records: impl IntoIterator<Item = RawHour>) -> Result<Vec<RawHour>, ProviderError> {
    let mut buckets: BTreeMap<DateTime<Utc>, (f64, u32)> = BTreeMap::new();
    for record in records {
        if !record.price.is_finite() {
            return Err(ProviderError::Malformed(format!(
                "non-finite price at {}",
                record.start
            )));
        }
        let hour = record
            .start
            .duration_trunc(TimeDelta::hours(1))
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let bucket = buckets.entry(hour).or_insert((0.0, 0));
        bucket.0 += record.price;
        bucket.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(start, (sum, count))| RawHour::new(start, sum / f64::from(count)))
        .collect())
}
