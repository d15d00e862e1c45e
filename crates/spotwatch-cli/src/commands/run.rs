use std::path::Path;

use spotwatch_core::notifier::NotifierKind;
use spotwatch_core::provider::NordPoolProvider;
use spotwatch_core::scheduler::TokioJobScheduler;
use spotwatch_core::watcher::PriceWatcher;

use super::load_config;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let market = &config.market;
    let provider = NordPoolProvider::new(&market.api_url, &market.area, &market.currency)?;
    let notifier = NotifierKind::from_config(&config.notifier)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        tracing::info!(
            area = %config.market.area,
            timezone = %config.market.timezone,
            "starting price watcher"
        );
        let jobs = TokioJobScheduler::current();
        let mut watcher = PriceWatcher::new(config, provider, jobs, notifier)?;

        tokio::select! {
            () = watcher.run() => {}
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("interrupted, cancelling pending triggers");
            }
        }
        watcher.shutdown();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
