//! IFTTT Maker webhook notifier.

use reqwest::Client;
use serde_json::json;
use url::Url;

use super::{Notification, Notifier};
use crate::error::{ConfigError, DeliveryError};
use crate::pricing::PriceClass;

pub const DEFAULT_IFTTT_URL: &str = "https://maker.ifttt.com";

/// Maker event name for a price class.
pub fn event_name(class: PriceClass) -> &'static str {
    match class {
        PriceClass::Low => "nordpool-price-low",
        PriceClass::Normal => "nordpool-price-normal",
        PriceClass::High => "nordpool-price-high",
    }
}

/// Posts `value1`..`value3` to `/trigger/<event>/with/key/<key>`.
#[derive(Debug, Clone)]
pub struct IftttNotifier {
    client: Client,
    base_url: Url,
    key: String,
}

impl IftttNotifier {
    /// # Errors
    ///
    /// Returns an error if `base_url` cannot be used as a base URL.
    pub fn new(base_url: &str, key: &str) -> Result<Self, ConfigError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ConfigError::invalid("notifier.ifttt_url", e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::invalid(
                "notifier.ifttt_url",
                "must be an absolute http(s) URL",
            ));
        }
        Ok(Self {
            client: Client::new(),
            base_url,
            key: key.to_string(),
        })
    }

    fn trigger_url(&self, class: PriceClass) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["trigger", event_name(class), "with", "key", &self.key]);
        }
        url
    }
}

impl Notifier for IftttNotifier {
    fn name(&self) -> &str {
        "ifttt"
    }

    async fn notify(&self, notification: &Notification) -> Result<(), DeliveryError> {
        if self.key.is_empty() {
            return Err(DeliveryError::NotConfigured("IFTTT key is empty".into()));
        }

        let body = json!({
            "value1": notification.value,
            "value2": notification.currency,
            "value3": notification.local_time_label,
        });
        let resp = self
            .client
            .post(self.trigger_url(notification.class))
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(DeliveryError::Rejected { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_url_names_event_and_key() {
        let notifier = IftttNotifier::new("https://maker.ifttt.com/", "secret").unwrap();
        assert_eq!(
            notifier.trigger_url(PriceClass::High).as_str(),
            "https://maker.ifttt.com/trigger/nordpool-price-high/with/key/secret"
        );
        assert_eq!(
            notifier.trigger_url(PriceClass::Low).as_str(),
            "https://maker.ifttt.com/trigger/nordpool-price-low/with/key/secret"
        );
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(IftttNotifier::new("mailto:someone@example.com", "k").is_err());
    }

    #[tokio::test]
    async fn empty_key_is_not_configured() {
        let notifier = IftttNotifier::new(DEFAULT_IFTTT_URL, "").unwrap();
        let n = Notification {
            class: PriceClass::Low,
            value: 1.0,
            currency: "EUR/MWh".into(),
            local_time_label: "3:00".into(),
        };
        assert!(matches!(
            notifier.notify(&n).await,
            Err(DeliveryError::NotConfigured(_))
        ));
    }
}
