//! End-to-end trigger tests: refresh through the watcher, fire on a paused
//! tokio clock, and check what the notifier received.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use spotwatch_core::error::{CoreError, DeliveryError, ProviderError};
use spotwatch_core::events::TransitionEvent;
use spotwatch_core::notifier::{Notification, Notifier};
use spotwatch_core::pricing::{PriceClass, RawHour};
use spotwatch_core::provider::{JsonFileProvider, PriceProvider};
use spotwatch_core::scheduler::{TokioJobScheduler, TriggerScheduler};
use spotwatch_core::storage::Config;
use spotwatch_core::watcher::PriceWatcher;

#[derive(Clone, Default)]
struct RecordingNotifier {
    received: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.received.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Hands out queued responses, one per fetch.
struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<RawHour>, ProviderError>>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<Result<Vec<RawHour>, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

impl PriceProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<RawHour>, ProviderError> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::NotPublished { date }))
    }
}

/// Tomorrow in UTC, so every trigger lies in the future.
fn date() -> NaiveDate {
    (Utc::now() + Duration::days(1)).date_naive()
}

fn midnight() -> DateTime<Utc> {
    Utc.from_utc_datetime(&date().and_hms_opt(0, 0, 0).unwrap())
}

/// 24 hours at 50 with a HIGH spike at `spike_hour`.
fn day_with_spike(spike_hour: i64) -> Vec<RawHour> {
    (0..24)
        .map(|h| {
            let price = if h == spike_hour { 150.0 } else { 50.0 };
            RawHour::new(midnight() + Duration::hours(h), price)
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_trigger_fires_once_with_local_label() {
    let notifier = RecordingNotifier::default();
    let received = Arc::clone(&notifier.received);
    let mut triggers = TriggerScheduler::new(
        TokioJobScheduler::current(),
        notifier,
        chrono_tz::Europe::Helsinki,
    );

    let now = Utc::now();
    let fires_at = now + Duration::hours(1);
    let event = TransitionEvent {
        timestamp: fires_at,
        value: 180.25,
        currency: "EUR".into(),
        class: PriceClass::High,
    };
    let scheduled = triggers.schedule_day(date(), &[event], now);
    assert_eq!(scheduled.len(), 1);

    tokio::time::sleep(std::time::Duration::from_secs(30 * 60)).await;
    assert!(received.lock().unwrap().is_empty());

    tokio::time::sleep(std::time::Duration::from_secs(2 * 60 * 60)).await;
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].class, PriceClass::High);
    assert_eq!(received[0].value, 180.25);
    assert_eq!(received[0].currency, "EUR/MWh");
    let expected = fires_at
        .with_timezone(&chrono_tz::Europe::Helsinki)
        .format("%-H:%M")
        .to_string();
    assert_eq!(received[0].local_time_label, expected);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_all_prevents_delivery() {
    let notifier = RecordingNotifier::default();
    let received = Arc::clone(&notifier.received);
    let mut triggers = TriggerScheduler::new(TokioJobScheduler::current(), notifier, chrono_tz::UTC);

    let now = Utc::now();
    let event = TransitionEvent {
        timestamp: now + Duration::minutes(10),
        value: 5.0,
        currency: "EUR".into(),
        class: PriceClass::Low,
    };
    triggers.schedule_day(date(), &[event], now);
    triggers.cancel_all();

    tokio::time::sleep(std::time::Duration::from_secs(60 * 60)).await;
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_replaces_pending_triggers_for_the_day() {
    let provider = ScriptedProvider::new(vec![Ok(day_with_spike(10)), Ok(day_with_spike(15))]);
    let mut watcher = PriceWatcher::new(
        Config::default(),
        provider,
        TokioJobScheduler::current(),
        RecordingNotifier::default(),
    )
    .unwrap();

    let now = midnight() - Duration::hours(1);
    let first = watcher.refresh_at(date(), now).await.unwrap();
    assert_eq!(first.hours, 24);
    assert_eq!(first.events.len(), 2);
    assert_eq!(first.scheduled.len(), 2);

    let second = watcher.refresh_at(date(), now).await.unwrap();
    let pending: Vec<DateTime<Utc>> = watcher
        .triggers()
        .pending()
        .iter()
        .map(|t| t.fires_at)
        .collect();
    assert_eq!(second.scheduled.len(), 2);
    assert_eq!(
        pending,
        vec![midnight() + Duration::hours(15), midnight() + Duration::hours(16)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_refresh_keeps_existing_triggers() {
    let provider = ScriptedProvider::new(vec![
        Ok(day_with_spike(10)),
        Err(ProviderError::Status {
            status: 503,
            body: "busy".into(),
        }),
    ]);
    let mut watcher = PriceWatcher::new(
        Config::default(),
        provider,
        TokioJobScheduler::current(),
        RecordingNotifier::default(),
    )
    .unwrap();

    let now = midnight() - Duration::hours(1);
    watcher.refresh_at(date(), now).await.unwrap();
    let err = watcher.refresh_at(date(), now).await.unwrap_err();

    assert!(matches!(
        err,
        CoreError::Provider(ProviderError::Status { status: 503, .. })
    ));
    assert_eq!(watcher.triggers().pending().len(), 2);

    watcher.shutdown();
    assert!(watcher.triggers().pending().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_refresh_skips_hours_already_past() {
    let provider = ScriptedProvider::new(vec![Ok(day_with_spike(10))]);
    let mut watcher = PriceWatcher::new(
        Config::default(),
        provider,
        TokioJobScheduler::current(),
        RecordingNotifier::default(),
    )
    .unwrap();

    let summary = watcher
        .refresh_at(date(), midnight() + Duration::hours(10) + Duration::minutes(30))
        .await
        .unwrap();

    assert_eq!(summary.events.len(), 2);
    assert_eq!(summary.scheduled.len(), 1);
    assert_eq!(summary.scheduled[0].payload.class, PriceClass::Normal);
}

#[tokio::test]
async fn test_refresh_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&day_with_spike(20)).unwrap();
    write!(file, "{json}").unwrap();

    let mut config = Config::default();
    config.market.timezone = "Europe/Stockholm".into();
    let mut watcher = PriceWatcher::new(
        config,
        JsonFileProvider::new(file.path()),
        TokioJobScheduler::current(),
        RecordingNotifier::default(),
    )
    .unwrap();

    let summary = watcher
        .refresh_at(date(), midnight() - Duration::days(1))
        .await
        .unwrap();

    assert_eq!(summary.date, date());
    assert_eq!(summary.hours, 24);
    assert_eq!(summary.events[0].class, PriceClass::High);
    assert_eq!(summary.events[0].timestamp, midnight() + Duration::hours(20));

    watcher.shutdown();
}

#[test]
fn test_invalid_config_is_rejected_up_front() {
    let mut config = Config::default();
    config.market.timezone = "Mars/Olympus_Mons".into();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let result = PriceWatcher::new(
        config,
        ScriptedProvider::new(Vec::new()),
        TokioJobScheduler::new(rt.handle().clone()),
        RecordingNotifier::default(),
    );

    assert!(result.is_err());
}

/// Rejects HIGH notifications and accepts everything else, recording
/// every attempt.
#[derive(Clone, Default)]
struct HighRejectingNotifier {
    attempts: Arc<Mutex<Vec<PriceClass>>>,
}

impl Notifier for HighRejectingNotifier {
    fn name(&self) -> &str {
        "high-rejecting"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.attempts.lock().unwrap().push(notification.class);
        match notification.class {
            PriceClass::High => Err(DeliveryError::NotConfigured("no key".into())),
            _ => Ok(()),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_delivery_does_not_affect_other_triggers() {
    let notifier = HighRejectingNotifier::default();
    let attempts = Arc::clone(&notifier.attempts);
    let mut triggers = TriggerScheduler::new(TokioJobScheduler::current(), notifier, chrono_tz::UTC);

    let now = Utc::now();
    let events = [
        TransitionEvent {
            timestamp: now + Duration::hours(1),
            value: 150.0,
            currency: "EUR".into(),
            class: PriceClass::High,
        },
        TransitionEvent {
            timestamp: now + Duration::hours(2),
            value: 50.0,
            currency: "EUR".into(),
            class: PriceClass::Normal,
        },
    ];
    triggers.schedule_day(date(), &events, now);

    tokio::time::sleep(std::time::Duration::from_secs(90 * 60)).await;
    assert_eq!(*attempts.lock().unwrap(), vec![PriceClass::High]);

    tokio::time::sleep(std::time::Duration::from_secs(3 * 60 * 60)).await;
    assert_eq!(
        *attempts.lock().unwrap(),
        vec![PriceClass::High, PriceClass::Normal]
    );
    assert!(triggers.pending().is_empty());
}
