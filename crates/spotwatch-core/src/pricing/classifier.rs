//! Threshold classifier.

use serde::{Deserialize, Serialize};

use super::PriceClass;

/// Thresholds and run-length caps, read-only for a whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Adjusted prices strictly below this are LOW.
    pub low_threshold: f64,
    /// Adjusted prices strictly above this are HIGH.
    pub high_threshold: f64,
    /// Longest LOW run that is reported as-is.
    pub max_low_run: usize,
    /// Longest HIGH run that is reported as-is.
    pub max_high_run: usize,
    /// Tax added on top of the raw price, in percent.
    #[serde(default)]
    pub tax_percent: Option<f64>,
}

impl Thresholds {
    /// Maximum reportable run length for a class. `None` means unbounded.
    pub fn run_limit(&self, class: PriceClass) -> Option<usize> {
        match class {
            PriceClass::Low => Some(self.max_low_run),
            PriceClass::High => Some(self.max_high_run),
            PriceClass::Normal => None,
        }
    }
}

/// Apply the tax percentage and round to two decimals.
///
/// Halves round toward positive infinity so negative prices round the
/// same way the market feed does.
pub fn adjust_for_tax(raw: f64, tax_percent: Option<f64>) -> f64 {
    match tax_percent {
        Some(tax) if tax != 0.0 => (raw * (100.0 + tax) + 0.5).floor() / 100.0,
        _ => raw,
    }
}

/// Classify an adjusted value. Values equal to a threshold are NORMAL.
pub fn classify_value(adjusted: f64, thresholds: &Thresholds) -> PriceClass {
    if adjusted > thresholds.high_threshold {
        PriceClass::High
    } else if adjusted < thresholds.low_threshold {
        PriceClass::Low
    } else {
        PriceClass::Normal
    }
}
