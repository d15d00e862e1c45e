//! Notifiers deliver a fired trigger to the outside world.
//!
//! Delivery is best effort: a failed delivery is reported to the caller
//! and never retried here.

mod ifttt;
mod log;

pub use ifttt::{event_name, IftttNotifier, DEFAULT_IFTTT_URL};
pub use log::LogNotifier;

use std::future::Future;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, DeliveryError};
use crate::events::TransitionEvent;
use crate::pricing::PriceClass;
use crate::storage::{NotifierConfig, NotifierKindConfig};

/// What a notifier receives when a trigger fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub class: PriceClass,
    pub value: f64,
    /// Unit label, e.g. `EUR/MWh`.
    pub currency: String,
    /// Local wall-clock time of the event, e.g. `7:00`.
    pub local_time_label: String,
}

impl Notification {
    pub fn for_event(event: &TransitionEvent, tz: Tz) -> Self {
        Self {
            class: event.class,
            value: event.value,
            currency: format!("{}/MWh", event.currency),
            local_time_label: local_time_label(event.timestamp, tz),
        }
    }
}

/// Format an instant as `H:mm` in the target timezone.
pub fn local_time_label(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%-H:%M").to_string()
}

/// Every delivery channel implements this trait.
pub trait Notifier: Send + Sync + 'static {
    /// Unique identifier (e.g. "ifttt", "log").
    fn name(&self) -> &str;

    /// Deliver one notification.
    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Notifier selected by configuration.
#[derive(Debug, Clone)]
pub enum NotifierKind {
    Ifttt(IftttNotifier),
    Log(LogNotifier),
}

impl NotifierKind {
    /// # Errors
    ///
    /// Returns an error if the configured endpoint URL is invalid.
    pub fn from_config(config: &NotifierConfig) -> Result<Self, ConfigError> {
        match config.kind {
            NotifierKindConfig::Ifttt => Ok(NotifierKind::Ifttt(IftttNotifier::new(
                &config.ifttt_url,
                &config.ifttt_key,
            )?)),
            NotifierKindConfig::Log => Ok(NotifierKind::Log(LogNotifier)),
        }
    }
}

impl Notifier for NotifierKind {
    fn name(&self) -> &str {
        match self {
            NotifierKind::Ifttt(n) => n.name(),
            NotifierKind::Log(n) => n.name(),
        }
    }

    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        match self {
            NotifierKind::Ifttt(n) => n.notify(notification).await,
            NotifierKind::Log(n) => n.notify(notification).await,
        }
    }
}
