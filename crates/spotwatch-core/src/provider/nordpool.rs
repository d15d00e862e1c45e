//! Nord Pool day-ahead prices over the public data portal API.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use super::{to_hourly, PriceProvider};
use crate::error::{ConfigError, ProviderError};
use crate::pricing::RawHour;

pub const DEFAULT_API_URL: &str = "https://dataportal-api.nordpoolgroup.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DayAheadPrices {
    #[serde(default)]
    multi_area_entries: Vec<AreaEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AreaEntry {
    delivery_start: DateTime<Utc>,
    entry_per_area: HashMap<String, f64>,
}

/// Fetches one delivery area's day-ahead prices.
#[derive(Debug, Clone)]
pub struct NordPoolProvider {
    client: Client,
    endpoint: Url,
    area: String,
    currency: String,
}

impl NordPoolProvider {
    /// # Errors
    ///
    /// Returns an error if `api_url` is not a valid base URL.
    pub fn new(api_url: &str, area: &str, currency: &str) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(api_url)
            .and_then(|base| base.join("/api/DayAheadPrices"))
            .map_err(|e| ConfigError::invalid("market.api_url", e.to_string()))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
            area: area.to_string(),
            currency: currency.to_string(),
        })
    }

    fn request_url(&self, date: NaiveDate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("date", &date.format("%Y-%m-%d").to_string())
            .append_pair("market", "DayAhead")
            .append_pair("deliveryArea", &self.area)
            .append_pair("currency", &self.currency);
        url
    }

    fn parse(&self, date: NaiveDate, body: &str) -> Result<Vec<RawHour>, ProviderError> {
        let prices: DayAheadPrices =
            serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

        let records = prices
            .multi_area_entries
            .into_iter()
            .map(|entry| {
                entry
                    .entry_per_area
                    .get(&self.area)
                    .map(|&price| RawHour::new(entry.delivery_start, price))
                    .ok_or_else(|| {
                        ProviderError::Malformed(format!(
                            "no price for area {} at {}",
                            self.area, entry.delivery_start
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let hours = to_hourly(records)?;
        if hours.is_empty() {
            return Err(ProviderError::Empty { date });
        }
        Ok(hours)
    }
}

impl PriceProvider for NordPoolProvider {
    fn name(&self) -> &str {
        "nordpool"
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<RawHour>, ProviderError> {
        let resp = self.client.get(self.request_url(date)).send().await?;

        match resp.status() {
            StatusCode::NO_CONTENT => Err(ProviderError::NotPublished { date }),
            status if status.is_success() => {
                let body = resp.text().await?;
                self.parse(date, &body)
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(ProviderError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
