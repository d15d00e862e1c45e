pub mod classify;
pub mod config;
pub mod events;
pub mod run;

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::Args;
use spotwatch_core::provider::{JsonFileProvider, NordPoolProvider, PriceProvider};
use spotwatch_core::watcher::local_date;
use spotwatch_core::{Config, RawHour};

/// Selects the day to inspect.
#[derive(Args)]
pub struct DayArgs {
    /// Delivery date (YYYY-MM-DD, defaults to today in the market timezone)
    #[arg(long)]
    pub date: Option<NaiveDate>,
    /// Read prices from a JSON file instead of the market API
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Load and validate the config at `path`, or the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.validate()?;
    Ok(config)
}

/// Fetch the raw prices for the day `args` selects.
pub fn fetch_day(
    config: &Config,
    args: &DayArgs,
) -> Result<(NaiveDate, Vec<RawHour>), Box<dyn std::error::Error>> {
    let date = match args.date {
        Some(date) => date,
        None => local_date(Utc::now(), config.timezone()?),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let hours = match &args.input {
        Some(path) => rt.block_on(JsonFileProvider::new(path).fetch_day(date))?,
        None => {
            let market = &config.market;
            let provider = NordPoolProvider::new(&market.api_url, &market.area, &market.currency)?;
            rt.block_on(provider.fetch_day(date))?
        }
    };
    Ok((date, hours))
}
