use std::path::Path;

use spotwatch_core::notifier::local_time_label;
use spotwatch_core::watcher::derive_for;

use super::{fetch_day, load_config, DayArgs};

pub fn run(config_path: Option<&Path>, args: DayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let tz = config.timezone()?;
    let (date, hours) = fetch_day(&config, &args)?;
    let derivation = derive_for(&hours, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&derivation.events)?);
        return Ok(());
    }

    if derivation.events.is_empty() {
        println!("{date}: no transitions");
        return Ok(());
    }
    println!("{date}: {} transition(s)", derivation.events.len());
    for event in &derivation.events {
        println!(
            "  {:>5}  {:<6}  {:>8.2} {}/MWh",
            local_time_label(event.timestamp, tz),
            event.class,
            event.value,
            event.currency
        );
    }
    Ok(())
}
