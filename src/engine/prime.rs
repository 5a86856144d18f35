//! Percentage-of-fee model for bookings the guest pays for.

use crate::domain::{Booking, BookingClassification, EarningType};

use super::{
    Calculation, CalculationError, ConciergeRate, EarningsStrategy, PrimeRates, PromotionWindow,
};

#[derive(Debug, Clone)]
pub struct PrimeCalculator {
    promotion: PromotionWindow,
}

impl PrimeCalculator {
    pub fn new(promotion: PromotionWindow) -> Self {
        Self { promotion }
    }
}

impl EarningsStrategy for PrimeCalculator {
    type Rates = PrimeRates;

    /// Split `total_fee` between venue, concierge, partners, and platform.
    ///
    /// Partner shares are taken independently from the same residual (fee
    /// minus venue and concierge). The platform keeps whatever is left,
    /// including rounding remainders, and is allowed to go negative.
    fn calculate(
        &self,
        booking: &Booking,
        rates: &PrimeRates,
    ) -> Result<Calculation, CalculationError> {
        let mut calc = Calculation::empty(BookingClassification::Prime, &booking.currency);
        let fee = booking.total_fee;
        if fee == 0 {
            return Ok(calc);
        }

        let overflow = |quantity| CalculationError::Overflow {
            booking_id: booking.id.as_i64(),
            quantity,
        };

        let venue = rates.venue.apply(fee);
        let concierge = match rates.concierge {
            ConciergeRate::Percent(rate) => rate.apply(fee),
            ConciergeRate::OmakasePerGuest(per_guest) => per_guest
                .checked_mul(booking.guest_count)
                .ok_or_else(|| overflow("omakase concierge fee"))?,
        };
        let concierge = self
            .promotion
            .apply(concierge, booking)
            .ok_or_else(|| overflow("promotional concierge earnings"))?;

        let residual = fee
            .checked_sub(venue)
            .and_then(|r| r.checked_sub(concierge))
            .ok_or_else(|| overflow("partner residual"))?;
        let partner_venue = rates
            .partner_venue
            .map(|p| p.rate.apply(residual))
            .unwrap_or(0);
        let partner_concierge = rates
            .partner_concierge
            .map(|p| p.rate.apply(residual))
            .unwrap_or(0);

        calc.push(rates.venue_user, EarningType::Venue, venue);
        calc.push(rates.concierge_user, EarningType::Concierge, concierge);
        if let Some(p) = rates.partner_venue {
            calc.push(p.user_id, EarningType::PartnerVenue, partner_venue);
        }
        if let Some(p) = rates.partner_concierge {
            calc.push(p.user_id, EarningType::PartnerConcierge, partner_concierge);
        }

        calc.platform_earnings = residual
            .checked_sub(partner_venue)
            .and_then(|p| p.checked_sub(partner_concierge))
            .ok_or_else(|| overflow("platform earnings"))?;
        calc.expected_total = fee;
        Ok(calc)
    }
}
