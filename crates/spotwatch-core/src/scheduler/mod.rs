//! Trigger scheduling.
//!
//! Every transition event becomes one job that fires at the event's hour
//! and hands the event to the notifier exactly once. Registration is fire
//! and forget: nothing waits for delivery and failed deliveries are only
//! logged.
//!
//! Pending triggers are kept per delivery day. Scheduling a day again
//! cancels that day's triggers that have not fired yet before registering
//! the new set; other days are left alone.

mod job;

pub use job::{Job, JobHandle, JobScheduler, TokioJobHandle, TokioJobScheduler};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DeliveryError;
use crate::events::TransitionEvent;
use crate::notifier::{Notification, Notifier};

/// A transition event bound to the instant it fires at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTrigger {
    pub id: String,
    pub fires_at: DateTime<Utc>,
    pub payload: TransitionEvent,
}

impl ScheduledTrigger {
    pub fn new(payload: TransitionEvent) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fires_at: payload.timestamp,
            payload,
        }
    }
}

struct Pending<H> {
    trigger: ScheduledTrigger,
    handle: H,
}

/// Schedules transition events on a job facility.
pub struct TriggerScheduler<S: JobScheduler, N: Notifier> {
    jobs: S,
    notifier: Arc<N>,
    tz: Tz,
    book: BTreeMap<NaiveDate, Vec<Pending<S::Handle>>>,
}

impl<S: JobScheduler, N: Notifier> TriggerScheduler<S, N> {
    pub fn new(jobs: S, notifier: N, tz: Tz) -> Self {
        Self {
            jobs,
            notifier: Arc::new(notifier),
            tz,
            book: BTreeMap::new(),
        }
    }

    /// Replace the triggers of `day` with one trigger per event.
    ///
    /// Events before `now` are skipped. Returns the triggers that
    /// were registered.
    pub fn schedule_day(
        &mut self,
        day: NaiveDate,
        events: &[TransitionEvent],
        now: DateTime<Utc>,
    ) -> Vec<ScheduledTrigger> {
        self.prune();
        if let Some(previous) = self.book.remove(&day) {
            for pending in previous {
                pending.handle.cancel();
                tracing::debug!(
                    %day,
                    id = %pending.trigger.id,
                    at = %pending.trigger.fires_at,
                    "cancelled superseded trigger"
                );
            }
        }

        let mut registered = Vec::new();
        for event in events {
            if event.timestamp < now {
                tracing::debug!(at = %event.timestamp, class = %event.class, "skipping past event");
                continue;
            }

            let trigger = ScheduledTrigger::new(event.clone());
            let handle = self.jobs.register_at(trigger.fires_at, self.job_for(&trigger));
            let local = trigger.fires_at.with_timezone(&self.tz);
            tracing::info!(
                at = %local.format("%-d.%-m. %-H:%M"),
                value = event.value,
                class = %event.class,
                "scheduled trigger"
            );
            registered.push(trigger.clone());
            self.book
                .entry(day)
                .or_default()
                .push(Pending { trigger, handle });
        }
        registered
    }

    /// Triggers registered and not yet fired or cancelled, in time order.
    pub fn pending(&self) -> Vec<&ScheduledTrigger> {
        let mut pending: Vec<_> = self
            .book
            .values()
            .flatten()
            .filter(|p| !p.handle.is_finished())
            .map(|p| &p.trigger)
            .collect();
        pending.sort_by_key(|t| t.fires_at);
        pending
    }

    /// Cancel every trigger that has not fired yet.
    pub fn cancel_all(&mut self) {
        let count: usize = self.book.values().map(Vec::len).sum();
        for pending in std::mem::take(&mut self.book).into_values().flatten() {
            pending.handle.cancel();
        }
        tracing::debug!(count, "cancelled all triggers");
    }

    /// Drop handles of triggers that already ran.
    fn prune(&mut self) {
        self.book.retain(|_, pending| {
            pending.retain(|p| !p.handle.is_finished());
            !pending.is_empty()
        });
    }

    fn job_for(&self, trigger: &ScheduledTrigger) -> Job {
        let notifier = Arc::clone(&self.notifier);
        let notification = Notification::for_event(&trigger.payload, self.tz);
        Box::pin(async move {
            // Failures are logged inside; each trigger stands alone.
            let _ = deliver(notifier.as_ref(), &notification).await;
        })
    }
}

impl<S: JobScheduler, N: Notifier> std::fmt::Debug for TriggerScheduler<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerScheduler")
            .field("notifier", &self.notifier.name())
            .field("tz", &self.tz)
            .field("days", &self.book.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Deliver one notification and log the outcome.
pub async fn deliver<N: Notifier>(
    notifier: &N,
    notification: &Notification,
) -> Result<(), DeliveryError> {
    tracing::info!(
        notifier = notifier.name(),
        class = %notification.class,
        value = notification.value,
        unit = %notification.currency,
        at = %notification.local_time_label,
        "posting price event"
    );
    match notifier.notify(notification).await {
        Ok(()) => {
            tracing::info!(notifier = notifier.name(), "delivered");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(notifier = notifier.name(), error = %e, "delivery failed");
            Err(e)
        }
    }
}
