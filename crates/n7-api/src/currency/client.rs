use std::collections::HashMap;

use n7_booking::currency::{BASE_CURRENCY, fallback_rates};
use serde::{Deserialize, Serialize};

/// Where a rate table came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    Live,
    Fallback,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    rates: HashMap<String, f64>,
}

/// USD-based exchange rates from a public rates API
#[derive(Clone, Debug)]
pub struct ExchangeRateClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Current rates, or the static table when the API cannot be reached
    pub async fn rates(&self) -> (HashMap<String, f64>, RateSource) {
        match self.fetch_live().await {
            Ok(rates) if !rates.is_empty() => (rates, RateSource::Live),
            Ok(_) => {
                tracing::warn!("Exchange rate API returned no rates, using fallback");
                (fallback_rates(), RateSource::Fallback)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch exchange rates, using fallback: {e}");
                (fallback_rates(), RateSource::Fallback)
            }
        }
    }

    async fn fetch_live(&self) -> Result<HashMap<String, f64>, reqwest::Error> {
        let url = format!("{}/{BASE_CURRENCY}", self.base_url);

        let body: LatestRates = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body.rates)
    }
}
