//! Pure computation engine for booking earnings.
//!
//! Nothing in here touches the database: callers load a booking and its
//! parties, hand them to [`EarningsEngine::calculate`], and persist the
//! resulting [`Calculation`] through the ledger writer.

use crate::domain::{Booking, BookingParties};
use thiserror::Error;

pub mod calculation;
pub mod non_prime;
pub mod prime;
pub mod promotion;
pub mod rates;
pub mod refund;

pub use calculation::Calculation;
pub use non_prime::NonPrimeCalculator;
pub use prime::PrimeCalculator;
pub use promotion::PromotionWindow;
pub use rates::{
    ConciergeRate, MissingConfigurationError, NonPrimeRates, PartnerRate, PlatformRates,
    PrimeRates, RateResolver, RateSet,
};

/// One earnings model. Each implementation consumes the rate shape it needs.
pub trait EarningsStrategy {
    type Rates;

    fn calculate(&self, booking: &Booking, rates: &Self::Rates)
        -> Result<Calculation, CalculationError>;
}

#[derive(Debug, Error)]
pub enum CalculationError {
    #[error(transparent)]
    MissingConfiguration(#[from] MissingConfigurationError),
    #[error("booking {booking_id} does not reconcile: expected {expected}, ledger totals {actual}")]
    Reconciliation {
        booking_id: i64,
        expected: i64,
        actual: i64,
    },
    #[error("booking {booking_id}: {quantity} exceeds the representable amount")]
    Overflow {
        booking_id: i64,
        quantity: &'static str,
    },
}

/// Resolves rates, dispatches on classification, and applies refunds.
#[derive(Debug, Clone)]
pub struct EarningsEngine {
    resolver: RateResolver,
    prime: PrimeCalculator,
    non_prime: NonPrimeCalculator,
}

impl EarningsEngine {
    pub fn new(platform: PlatformRates, promotion: PromotionWindow) -> Self {
        Self {
            resolver: RateResolver::new(platform),
            prime: PrimeCalculator::new(promotion),
            non_prime: NonPrimeCalculator,
        }
    }

    /// Compute the full ledger for a booking in its current state.
    ///
    /// Pending and cancelled bookings yield an empty calculation without
    /// consulting payout configuration.
    pub fn calculate(
        &self,
        booking: &Booking,
        parties: &BookingParties,
    ) -> Result<Calculation, CalculationError> {
        if !booking.status.earns() {
            return Ok(Calculation::empty(booking.classification(), &booking.currency));
        }

        let rates = self.resolver.resolve(booking, parties)?;
        let mut calculation = match &rates {
            RateSet::Prime(r) => self.prime.calculate(booking, r)?,
            RateSet::NonPrime(r) => self.non_prime.calculate(booking, r)?,
        };

        if booking.is_prime {
            // Refund lines are derived from a base ledger that must balance first.
            calculation.reconcile(booking.id)?;
            refund::apply_refund(&mut calculation, booking.total_fee, booking.refunded_amount);
        }

        calculation.reconcile(booking.id)?;
        Ok(calculation)
    }
}
