//! Flat per-guest model for bookings with no guest charge.
//!
//! The venue funds both the concierge bounty and the platform margin, so its
//! ledger line is a debit (`venue_paid`, negative).

use crate::domain::{Booking, BookingClassification, EarningType};

use super::{Calculation, CalculationError, EarningsStrategy, NonPrimeRates};

#[derive(Debug, Clone, Copy, Default)]
pub struct NonPrimeCalculator;

impl EarningsStrategy for NonPrimeCalculator {
    type Rates = NonPrimeRates;

    fn calculate(
        &self,
        booking: &Booking,
        rates: &NonPrimeRates,
    ) -> Result<Calculation, CalculationError> {
        let mut calc = Calculation::empty(BookingClassification::NonPrime, &booking.currency);

        let overflow = |quantity| CalculationError::Overflow {
            booking_id: booking.id.as_i64(),
            quantity,
        };

        let fee = rates
            .fee_per_head
            .checked_mul(booking.guest_count)
            .ok_or_else(|| overflow("non-prime fee"))?;
        let bounty = rates.platform.non_prime_concierge.complement().apply(fee);
        let platform_concierge_share = fee - bounty;
        let platform_venue_share = rates.platform.non_prime_venue.apply(fee);
        let platform = platform_concierge_share
            .checked_add(platform_venue_share)
            .ok_or_else(|| overflow("platform earnings"))?;
        let venue_paid = bounty
            .checked_add(platform)
            .map(|charged| -charged)
            .ok_or_else(|| overflow("venue charge"))?;

        calc.push(rates.venue_user, EarningType::VenuePaid, venue_paid);
        calc.push(rates.concierge_user, EarningType::ConciergeBounty, bounty);
        calc.platform_earnings = platform;
        calc.expected_total = 0;
        Ok(calc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rate;
    use crate::engine::test_support::*;
    use crate::engine::PlatformRates;

    fn rates(fee_per_head: i64) -> NonPrimeRates {
        NonPrimeRates {
            venue_user: VENUE_USER,
            concierge_user: CONCIERGE_USER,
            fee_per_head,
            platform: PlatformRates::default(),
        }
    }

    #[test]
    fn test_three_guests_at_ten() {
        let booking = non_prime_booking(3);
        let calc = NonPrimeCalculator.calculate(&booking, &rates(10)).unwrap();
        calc.reconcile(booking.id).unwrap();

        assert_eq!(calc.amount_of(EarningType::ConciergeBounty), 24);
        // platform = (30 - 24) + round(30 * 0.10)
        assert_eq!(calc.platform_earnings, 9);
        assert_eq!(calc.amount_of(EarningType::VenuePaid), -33);
    }

    #[test]
    fn test_minor_unit_fee_scales_consistently() {
        let booking = non_prime_booking(3);
        let calc = NonPrimeCalculator.calculate(&booking, &rates(1000)).unwrap();
        assert_eq!(calc.amount_of(EarningType::ConciergeBounty), 2400);
        assert_eq!(calc.platform_earnings, 900);
        assert_eq!(calc.amount_of(EarningType::VenuePaid), -3300);
    }

    #[test]
    fn test_entry_types_and_payees() {
        let calc = NonPrimeCalculator
            .calculate(&non_prime_booking(2), &rates(500))
            .unwrap();
        assert_eq!(calc.entries.len(), 2);
        let venue = calc
            .entries
            .iter()
            .find(|e| e.earning_type == EarningType::VenuePaid)
            .unwrap();
        assert_eq!(venue.user_id, VENUE_USER);
        assert!(venue.amount < 0);
        let bounty = calc
            .entries
            .iter()
            .find(|e| e.earning_type == EarningType::ConciergeBounty)
            .unwrap();
        assert_eq!(bounty.user_id, CONCIERGE_USER);
        assert!(calc
            .entries
            .iter()
            .all(|e| e.earning_type != EarningType::Venue
                && e.earning_type != EarningType::Concierge));
    }

    #[test]
    fn test_platform_rates_are_independent() {
        let mut r = rates(1000);
        r.platform.non_prime_concierge = Rate::parse_fraction("0.30").unwrap();
        r.platform.non_prime_venue = Rate::zero();
        let booking = non_prime_booking(1);
        let calc = NonPrimeCalculator.calculate(&booking, &r).unwrap();
        calc.reconcile(booking.id).unwrap();
        assert_eq!(calc.amount_of(EarningType::ConciergeBounty), 700);
        assert_eq!(calc.platform_earnings, 300);
        assert_eq!(calc.amount_of(EarningType::VenuePaid), -1000);
    }

    #[test]
    fn test_zero_guests_emits_nothing() {
        let calc = NonPrimeCalculator
            .calculate(&non_prime_booking(0), &rates(1000))
            .unwrap();
        assert!(calc.entries.is_empty());
        assert_eq!(calc.platform_earnings, 0);
    }

    #[test]
    fn test_guest_product_overflow_is_an_error() {
        let err = NonPrimeCalculator
            .calculate(&non_prime_booking(i64::MAX / 2), &rates(1000))
            .unwrap_err();
        assert!(matches!(err, CalculationError::Overflow { booking_id: 1, .. }));
    }
}
