use std::path::Path;

use serde::Serialize;
use spotwatch_core::notifier::local_time_label;
use spotwatch_core::pricing::{classify_day, PriceClass};
use spotwatch_core::watcher::derive_for;

use super::{fetch_day, load_config, DayArgs};

#[derive(Serialize)]
struct HourRow {
    timestamp: chrono::DateTime<chrono::Utc>,
    raw_value: f64,
    adjusted_value: f64,
    class: PriceClass,
    /// Class after long runs are bounded.
    reported_class: PriceClass,
}

pub fn run(config_path: Option<&Path>, args: DayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let tz = config.timezone()?;
    let (date, hours) = fetch_day(&config, &args)?;

    let classified = classify_day(&hours, &config.thresholds());
    let bounded = derive_for(&hours, &config).hours;
    let rows: Vec<HourRow> = classified
        .iter()
        .zip(&bounded)
        .map(|(hour, reported)| HourRow {
            timestamp: hour.timestamp,
            raw_value: hour.raw_value,
            adjusted_value: hour.adjusted_value,
            class: hour.class,
            reported_class: reported.class,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{date} ({} {})", config.market.area, config.market.currency);
    for row in &rows {
        let clipped = if row.class != row.reported_class { " (clipped)" } else { "" };
        println!(
            "  {:>5}  {:>8.2}  {:>8.2}  {}{clipped}",
            local_time_label(row.timestamp, tz),
            row.raw_value,
            row.adjusted_value,
            row.class,
        );
    }
    Ok(())
}
