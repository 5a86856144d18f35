//! Resolves the payout rates a booking is priced with.

use crate::domain::{Booking, BookingParties, Partner, Rate, UserId};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// A required payout setting is absent on the named entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} {id} is missing required configuration: {field}")]
pub struct MissingConfigurationError {
    pub entity: &'static str,
    pub id: i64,
    pub field: &'static str,
}

impl MissingConfigurationError {
    pub fn new(entity: &'static str, id: i64, field: &'static str) -> Self {
        Self { entity, id, field }
    }
}

/// Platform cuts on the non-prime path, configured independently of any
/// venue or concierge setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformRates {
    /// Platform share of the non-prime per-guest fee before the concierge bounty.
    pub non_prime_concierge: Rate,
    /// Additional margin charged to the venue on top of the fee.
    pub non_prime_venue: Rate,
}

impl Default for PlatformRates {
    fn default() -> Self {
        Self {
            non_prime_concierge: Rate::from_fraction(Decimal::new(20, 2)),
            non_prime_venue: Rate::from_fraction(Decimal::new(10, 2)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartnerRate {
    pub user_id: UserId,
    pub rate: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConciergeRate {
    /// Percentage of the booking fee.
    Percent(Rate),
    /// Flat minor units per guest at omakase venues.
    OmakasePerGuest(i64),
}

impl fmt::Display for ConciergeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConciergeRate::Percent(r) => write!(f, "{}", r),
            ConciergeRate::OmakasePerGuest(fee) => write!(f, "{}/guest", fee),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimeRates {
    pub venue_user: UserId,
    pub concierge_user: UserId,
    pub venue: Rate,
    pub concierge: ConciergeRate,
    pub partner_venue: Option<PartnerRate>,
    pub partner_concierge: Option<PartnerRate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonPrimeRates {
    pub venue_user: UserId,
    pub concierge_user: UserId,
    pub fee_per_head: i64,
    pub platform: PlatformRates,
}

/// Rates for exactly one earnings model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSet {
    Prime(PrimeRates),
    NonPrime(NonPrimeRates),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RateResolver {
    platform: PlatformRates,
}

impl RateResolver {
    pub fn new(platform: PlatformRates) -> Self {
        Self { platform }
    }

    /// Read the rates for a booking from its parties' configuration.
    ///
    /// # Errors
    /// Returns [`MissingConfigurationError`] naming the first absent field
    /// the booking's classification depends on.
    pub fn resolve(
        &self,
        booking: &Booking,
        parties: &BookingParties,
    ) -> Result<RateSet, MissingConfigurationError> {
        let venue = &parties.venue;
        let concierge = &parties.concierge;

        if !booking.is_prime {
            let fee_per_head = venue.non_prime_fee_per_head.ok_or_else(|| {
                MissingConfigurationError::new("venue", venue.id, "non_prime_fee_per_head")
            })?;
            return Ok(RateSet::NonPrime(NonPrimeRates {
                venue_user: venue.user_id,
                concierge_user: concierge.user_id,
                fee_per_head,
                platform: self.platform,
            }));
        }

        let venue_rate = venue
            .payout_venue
            .ok_or_else(|| MissingConfigurationError::new("venue", venue.id, "payout_venue"))?;

        let concierge_rate = if venue.is_omakase {
            let fee = venue.omakase_concierge_fee.ok_or_else(|| {
                MissingConfigurationError::new("venue", venue.id, "omakase_concierge_fee")
            })?;
            ConciergeRate::OmakasePerGuest(fee)
        } else {
            let rate = concierge.payout_percentage.ok_or_else(|| {
                MissingConfigurationError::new("concierge", concierge.id, "payout_percentage")
            })?;
            ConciergeRate::Percent(rate)
        };

        Ok(RateSet::Prime(PrimeRates {
            venue_user: venue.user_id,
            concierge_user: concierge.user_id,
            venue: venue_rate,
            concierge: concierge_rate,
            partner_venue: partner_rate(parties.partner_venue.as_ref())?,
            partner_concierge: partner_rate(parties.partner_concierge.as_ref())?,
        }))
    }
}

fn partner_rate(partner: Option<&Partner>) -> Result<Option<PartnerRate>, MissingConfigurationError> {
    partner
        .map(|p| {
            p.percentage
                .map(|rate| PartnerRate {
                    user_id: p.user_id,
                    rate,
                })
                .ok_or_else(|| MissingConfigurationError::new("partner", p.id, "percentage"))
        })
        .transpose()
}
