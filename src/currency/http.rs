//! Exchange-rate client for a `GET {base}/latest?base=USD` JSON API.

use super::{CurrencyError, RateSource};
use crate::domain::Currency;
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

impl HttpRateSource {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    async fn get_latest(&self) -> Result<LatestRatesResponse, CurrencyError> {
        let url = format!("{}/latest?base=USD", self.base_url.trim_end_matches('/'));
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(10)),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = self
                .client
                .get(&url)
                .timeout(Duration::from_secs(5))
                .send()
                .await
                .map_err(|e| backoff::Error::transient(CurrencyError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 || status.is_server_error() {
                return Err(backoff::Error::transient(CurrencyError::Http {
                    status: status.as_u16(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(CurrencyError::Http {
                    status: status.as_u16(),
                }));
            }

            response
                .json::<LatestRatesResponse>()
                .await
                .map_err(|e| backoff::Error::permanent(CurrencyError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_usd_rates(&self) -> Result<HashMap<Currency, Decimal>, CurrencyError> {
        debug!(base_url = %self.base_url, "Fetching USD exchange rates");
        let response = self.get_latest().await?;
        Ok(parse_rates(response.rates))
    }
}

fn parse_rates(raw: HashMap<String, f64>) -> HashMap<Currency, Decimal> {
    let mut rates = HashMap::with_capacity(raw.len());
    for (code, value) in raw {
        match (Currency::from_str(&code), Decimal::try_from(value)) {
            (Ok(currency), Ok(rate)) => {
                rates.insert(currency, rate);
            }
            _ => warn!(code = %code, value, "Skipping unparseable exchange rate"),
        }
    }
    rates
}
