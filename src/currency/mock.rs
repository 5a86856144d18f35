//! Fixed exchange rates for tests and offline deployments.

use super::{CurrencyError, RateSource};
use crate::domain::Currency;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct StaticRateSource {
    rates: HashMap<Currency, Decimal>,
    fail: bool,
    fetches: AtomicUsize,
}

impl StaticRateSource {
    /// An empty table; every non-USD currency converts 1:1.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every fetch fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Add a rate quoted as units of `code` per 1 USD.
    ///
    /// # Panics
    /// Panics if `code` is not a three-letter currency code.
    pub fn with_rate(mut self, code: &str, per_usd: Decimal) -> Self {
        let currency = Currency::from_str(code).expect("valid currency code");
        self.rates.insert(currency, per_usd);
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_usd_rates(&self) -> Result<HashMap<Currency, Decimal>, CurrencyError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CurrencyError::Unavailable);
        }
        Ok(self.rates.clone())
    }
}
