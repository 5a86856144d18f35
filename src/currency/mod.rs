//! Currency conversion for read-side reporting.
//!
//! The ledger stores native-currency minor units and never depends on this
//! module. Conversion failures degrade to a 1:1 rate with a warning rather
//! than failing the caller.

use crate::domain::{round_minor, Currency};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::warn;

pub mod http;
pub mod mock;

pub use http::HttpRateSource;
pub use mock::StaticRateSource;

/// How long fetched rates are reused before asking the source again.
pub const RATE_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// How long a failed fetch keeps callers on 1:1 rates before retrying.
pub const RATE_FAILURE_TTL: Duration = Duration::from_secs(60);

/// Source of exchange rates quoted as units of each currency per 1 USD.
#[async_trait]
pub trait RateSource: Send + Sync + fmt::Debug {
    async fn fetch_usd_rates(&self) -> Result<HashMap<Currency, Decimal>, CurrencyError>;
}

#[derive(Debug, Clone, Error)]
pub enum CurrencyError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}")]
    Http { status: u16 },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Rate source unavailable")]
    Unavailable,
}

#[derive(Debug)]
struct CachedRates {
    rates: HashMap<Currency, Decimal>,
    expires_at: Instant,
}

/// Converts per-currency totals into USD minor units.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    cache: Arc<RwLock<Option<CachedRates>>>,
}

impl CurrencyConverter {
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self {
            source,
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Sum `amounts` (minor units per currency) as USD minor units.
    ///
    /// A currency without a usable rate is counted 1:1.
    pub async fn convert_to_usd(&self, amounts: &BTreeMap<Currency, i64>) -> i64 {
        let needs_rates = amounts.keys().any(|c| !c.is_usd());
        let rates = if needs_rates {
            self.rates().await
        } else {
            HashMap::new()
        };

        let mut total = Decimal::ZERO;
        for (currency, amount) in amounts {
            let amount = Decimal::from(*amount);
            if currency.is_usd() {
                total += amount;
                continue;
            }
            match rates.get(currency) {
                Some(rate) if !rate.is_zero() => total += amount / *rate,
                _ => {
                    warn!(currency = %currency, "No USD rate available, converting 1:1");
                    total += amount;
                }
            }
        }
        round_minor(total)
    }

    async fn rates(&self) -> HashMap<Currency, Decimal> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if Instant::now() < cached.expires_at {
                return cached.rates.clone();
            }
        }

        let (rates, ttl) = match self.source.fetch_usd_rates().await {
            Ok(rates) => (rates, RATE_CACHE_TTL),
            Err(e) => {
                warn!(error = %e, "Currency rate fetch failed, falling back to 1:1");
                (HashMap::new(), RATE_FAILURE_TTL)
            }
        };
        *self.cache.write().await = Some(CachedRates {
            rates: rates.clone(),
            expires_at: Instant::now() + ttl,
        });
        rates
    }
}
