use crate::domain::{Rate, TimeMs};
use crate::engine::{PlatformRates, PromotionWindow};
use std::collections::HashMap;
use thiserror::Error;

/// Default concierge promotion window: all of January 2025 (UTC).
const DEFAULT_PROMO_WINDOW_START: &str = "2025-01-01T00:00:00Z";
const DEFAULT_PROMO_WINDOW_END: &str = "2025-01-31T23:59:59Z";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Exchange-rate API; rates are fixed at 1:1 when unset.
    pub currency_api_url: Option<String>,
    pub promotion: PromotionWindow,
    pub platform_rates: PlatformRates,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let currency_api_url = env_map
            .get("CURRENCY_API_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let start = parse_timestamp(&env_map, "PROMO_WINDOW_START", DEFAULT_PROMO_WINDOW_START)?;
        let end = parse_timestamp(&env_map, "PROMO_WINDOW_END", DEFAULT_PROMO_WINDOW_END)?;
        if end < start {
            return Err(ConfigError::InvalidValue(
                "PROMO_WINDOW_END".to_string(),
                "must not be before PROMO_WINDOW_START".to_string(),
            ));
        }

        let defaults = PlatformRates::default();
        let platform_rates = PlatformRates {
            non_prime_concierge: parse_fraction(
                &env_map,
                "NON_PRIME_PLATFORM_CONCIERGE_RATE",
                defaults.non_prime_concierge,
            )?,
            non_prime_venue: parse_fraction(
                &env_map,
                "NON_PRIME_PLATFORM_VENUE_RATE",
                defaults.non_prime_venue,
            )?,
        };

        Ok(Config {
            port,
            database_path,
            currency_api_url,
            promotion: PromotionWindow::new(start, end),
            platform_rates,
        })
    }
}

fn parse_timestamp(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<TimeMs, ConfigError> {
    let raw = env_map.get(key).map(|s| s.as_str()).unwrap_or(default);
    chrono::DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| TimeMs::from(dt.with_timezone(&chrono::Utc)))
        .map_err(|_| {
            ConfigError::InvalidValue(key.to_string(), "must be an RFC 3339 timestamp".to_string())
        })
}

fn parse_fraction(
    env_map: &HashMap<String, String>,
    key: &str,
    default: Rate,
) -> Result<Rate, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(default);
    };
    let rate = Rate::parse_fraction(raw).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a decimal fraction".to_string())
    })?;
    if rate < Rate::zero() || rate.as_fraction() > rust_decimal::Decimal::ONE {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be between 0 and 1".to_string(),
        ));
    }
    Ok(rate)
}
