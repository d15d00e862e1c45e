//! Property tests for classification, bounding and derivation.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use spotwatch_core::events::EventDeriver;
use spotwatch_core::pricing::{classify_value, PriceClass, RawHour, Thresholds};
use spotwatch_core::streak::{best_window, Direction};

fn thresholds(max_low: usize, max_high: usize) -> Thresholds {
    Thresholds {
        low_threshold: 20.0,
        high_threshold: 100.0,
        max_low_run: max_low,
        max_high_run: max_high,
        tax_percent: None,
    }
}

fn day(prices: &[f64]) -> Vec<RawHour> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| RawHour::new(start + Duration::hours(i as i64), p))
        .collect()
}

// Whole prices keep window sums exact, so ties are real ties. Up to 25
// hours covers the autumn DST day.
fn prices() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((-50i32..250).prop_map(f64::from), 0..=25)
}

proptest! {
    #[test]
    fn classification_respects_strict_boundaries(value in -500.0f64..500.0) {
        let t = thresholds(4, 3);
        let class = classify_value(value, &t);
        prop_assert_eq!(class, classify_value(value, &t));
        match class {
            PriceClass::High => prop_assert!(value > t.high_threshold),
            PriceClass::Low => prop_assert!(value < t.low_threshold),
            PriceClass::Normal => {
                prop_assert!(value >= t.low_threshold && value <= t.high_threshold)
            }
        }
    }

    #[test]
    fn consecutive_events_never_share_a_class(prices in prices(), max_low in 1usize..6, max_high in 1usize..6) {
        let t = thresholds(max_low, max_high);
        let events = EventDeriver::new(&t, "EUR").derive(&day(&prices)).events;
        for pair in events.windows(2) {
            prop_assert_ne!(pair[0].class, pair[1].class);
            prop_assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn derivation_is_deterministic(prices in prices()) {
        let t = thresholds(4, 3);
        let hours = day(&prices);
        let first = EventDeriver::new(&t, "EUR").derive(&hours);
        let second = EventDeriver::new(&t, "EUR").derive(&hours);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn normal_first_hour_never_reports_midnight(prices in prices()) {
        prop_assume!(!prices.is_empty());
        let t = thresholds(4, 3);
        prop_assume!(classify_value(prices[0], &t) == PriceClass::Normal);

        let hours = day(&prices);
        let events = EventDeriver::new(&t, "EUR").derive(&hours).events;
        prop_assert!(events.iter().all(|e| e.timestamp != hours[0].start));
    }

    #[test]
    fn derived_hours_cover_the_input(prices in prices()) {
        let t = thresholds(2, 2);
        let hours = day(&prices);
        let derivation = EventDeriver::new(&t, "EUR").derive(&hours);
        prop_assert_eq!(derivation.hours.len(), hours.len());
        for (derived, raw) in derivation.hours.iter().zip(&hours) {
            prop_assert_eq!(derived.timestamp, raw.start);
        }
    }

    #[test]
    fn best_window_has_bounded_length_and_optimal_sum(
        values in prop::collection::vec((-100i32..100).prop_map(f64::from), 1..30),
        max in 1usize..8,
        maximize in any::<bool>(),
    ) {
        let direction = if maximize { Direction::Maximize } else { Direction::Minimize };
        let window = best_window(&values, max, direction);
        let len = max.min(values.len());
        prop_assert_eq!(window.len(), len);

        let chosen: f64 = values[window.clone()].iter().sum();
        for (start, other) in values.windows(len).enumerate() {
            let sum: f64 = other.iter().sum();
            if maximize {
                prop_assert!(chosen >= sum);
                if start < window.start {
                    prop_assert!(chosen > sum);
                }
            } else {
                prop_assert!(chosen <= sum);
                if start < window.start {
                    prop_assert!(chosen < sum);
                }
            }
        }
    }
}
