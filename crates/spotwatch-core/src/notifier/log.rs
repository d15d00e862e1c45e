//! Log-only notifier for dry runs.

use super::{Notification, Notifier};
use crate::error::DeliveryError;

/// Writes each notification to the log instead of delivering it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        tracing::info!(
            class = %notification.class,
            value = notification.value,
            unit = %notification.currency,
            at = %notification.local_time_label,
            "price event"
        );
        Ok(())
    }
}
