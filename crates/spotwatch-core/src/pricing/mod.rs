//! Hourly price points and their classification against thresholds.

mod classifier;

pub use classifier::{adjust_for_tax, classify_value, Thresholds};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price regime of a single hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceClass {
    Low,
    Normal,
    High,
}

impl PriceClass {
    /// Whether this is one of the extreme regimes that get bounded.
    pub fn is_extreme(self) -> bool {
        !matches!(self, PriceClass::Normal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceClass::Low => "low",
            PriceClass::Normal => "normal",
            PriceClass::High => "high",
        }
    }
}

impl std::fmt::Display for PriceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// One hourly record as delivered by a price provider, in currency/MWh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawHour {
    pub start: DateTime<Utc>,
    pub price: f64,
}

impl RawHour {
    pub fn new(start: DateTime<Utc>, price: f64) -> Self {
        Self { start, price }
    }
}

/// A classified hour.
///
/// Everything but `class` is fixed once classified; the streak bounding
/// step may demote `class` to [`PriceClass::Normal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourPoint {
    pub timestamp: DateTime<Utc>,
    pub raw_value: f64,
    pub adjusted_value: f64,
    pub class: PriceClass,
}

impl HourPoint {
    /// Classify a raw provider record.
    pub fn classify(raw: &RawHour, thresholds: &Thresholds) -> Self {
        let adjusted_value = adjust_for_tax(raw.price, thresholds.tax_percent);
        Self {
            timestamp: raw.start,
            raw_value: raw.price,
            adjusted_value,
            class: classify_value(adjusted_value, thresholds),
        }
    }
}

/// Classify a whole day in order.
pub fn classify_day(hours: &[RawHour], thresholds: &Thresholds) -> Vec<HourPoint> {
    hours
        .iter()
        .map(|raw| HourPoint::classify(raw, thresholds))
        .collect()
}
