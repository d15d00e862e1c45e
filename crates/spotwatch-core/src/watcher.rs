//! Refresh pipeline: provider → classifier → deriver → trigger scheduler.
//!
//! A refresh either completes or changes nothing. When the provider fails,
//! the triggers registered by earlier refreshes stay as they are.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{ConfigError, CoreError, ProviderError, Result};
use crate::events::{Derivation, EventDeriver, TransitionEvent};
use crate::notifier::Notifier;
use crate::pricing::RawHour;
use crate::provider::PriceProvider;
use crate::scheduler::{JobScheduler, ScheduledTrigger, TriggerScheduler};
use crate::storage::Config;

/// Outcome of one successful refresh.
#[derive(Debug, Clone)]
pub struct RefreshSummary {
    pub date: NaiveDate,
    pub hours: usize,
    pub events: Vec<TransitionEvent>,
    pub scheduled: Vec<ScheduledTrigger>,
}

/// Classify and derive events for one day of raw prices using `config`.
pub fn derive_for(hours: &[RawHour], config: &Config) -> Derivation {
    let thresholds = config.thresholds();
    EventDeriver::new(&thresholds, config.market.currency.as_str())
        .with_closure(config.closure_policy())
        .derive(hours)
}

/// Calendar date of `now` in `tz`.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

/// First `hour:minute` UTC strictly after `now`.
pub fn next_refresh_after(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .map(|naive| Utc.from_utc_datetime(&naive));
    match today {
        Some(at) if at > now => at,
        Some(at) => at + chrono::Duration::days(1),
        // Out-of-range times are rejected by config validation.
        None => now + chrono::Duration::days(1),
    }
}

/// Owns one provider and the trigger book, and keeps both in step.
pub struct PriceWatcher<P, S, N>
where
    P: PriceProvider,
    S: JobScheduler,
    N: Notifier,
{
    config: Config,
    tz: Tz,
    provider: P,
    triggers: TriggerScheduler<S, N>,
}

impl<P, S, N> PriceWatcher<P, S, N>
where
    P: PriceProvider,
    S: JobScheduler,
    N: Notifier,
{
    /// # Errors
    ///
    /// Returns an error if the configuration does not validate.
    pub fn new(config: Config, provider: P, jobs: S, notifier: N) -> Result<Self, ConfigError> {
        config.validate()?;
        let tz = config.timezone()?;
        Ok(Self {
            config,
            tz,
            provider,
            triggers: TriggerScheduler::new(jobs, notifier, tz),
        })
    }

    pub fn triggers(&self) -> &TriggerScheduler<S, N> {
        &self.triggers
    }

    /// Refresh `date` against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns the provider error if prices could not be fetched.
    pub async fn refresh(&mut self, date: NaiveDate) -> Result<RefreshSummary> {
        self.refresh_at(date, Utc::now()).await
    }

    /// Fetch `date`, derive its events and replace that day's triggers.
    ///
    /// # Errors
    ///
    /// Returns the provider error if prices could not be fetched; nothing
    /// is scheduled or cancelled in that case.
    pub async fn refresh_at(&mut self, date: NaiveDate, now: DateTime<Utc>) -> Result<RefreshSummary> {
        tracing::info!(%date, provider = self.provider.name(), "refreshing prices");
        let hours = self.provider.fetch_day(date).await?;
        if hours.is_empty() {
            return Err(ProviderError::Empty { date }.into());
        }

        let derivation = derive_for(&hours, &self.config);
        let scheduled = self.triggers.schedule_day(date, &derivation.events, now);
        tracing::info!(
            %date,
            hours = hours.len(),
            events = derivation.events.len(),
            scheduled = scheduled.len(),
            "refresh complete"
        );

        Ok(RefreshSummary {
            date,
            hours: hours.len(),
            events: derivation.events,
            scheduled,
        })
    }

    /// Refresh today and tomorrow, then tomorrow again at every daily
    /// refresh time. Never returns; refreshes run one after another.
    pub async fn run(&mut self) {
        let today = local_date(Utc::now(), self.tz);
        self.refresh_logged(today).await;
        if let Some(tomorrow) = today.checked_add_days(Days::new(1)) {
            self.refresh_logged(tomorrow).await;
        }

        loop {
            let now = Utc::now();
            let next = next_refresh_after(now, self.config.refresh.hour_utc, self.config.refresh.minute);
            tracing::debug!(at = %next, "next price refresh");
            tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

            let today = local_date(Utc::now(), self.tz);
            if let Some(tomorrow) = today.checked_add_days(Days::new(1)) {
                self.refresh_logged(tomorrow).await;
            }
        }
    }

    /// Cancel every pending trigger.
    pub fn shutdown(&mut self) {
        self.triggers.cancel_all();
    }

    async fn refresh_logged(&mut self, date: NaiveDate) {
        match self.refresh(date).await {
            Ok(_) => {}
            Err(CoreError::Provider(ProviderError::NotPublished { date })) => {
                tracing::info!(%date, "prices not published yet");
            }
            Err(e) => {
                tracing::error!(%date, error = %e, "price refresh failed; keeping existing triggers");
            }
        }
    }
}
