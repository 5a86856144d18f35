//! Output of an earnings strategy: the ledger lines plus the platform residual.

use crate::domain::{
    BookingAggregates, BookingClassification, BookingId, Currency, EarningEntry, EarningType,
    UserId,
};
use serde::Serialize;

use super::CalculationError;

/// A complete set of ledger lines for one booking.
///
/// The platform is not a user payee, so its share lives here rather than as
/// an entry. `entries` never contains zero amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Calculation {
    pub classification: BookingClassification,
    pub currency: Currency,
    pub entries: Vec<EarningEntry>,
    pub platform_earnings: i64,
    pub platform_earnings_refunded: i64,
    /// What entries plus net platform must sum to.
    pub expected_total: i64,
}

impl Calculation {
    pub fn empty(classification: BookingClassification, currency: &Currency) -> Self {
        Self {
            classification,
            currency: currency.clone(),
            entries: Vec::new(),
            platform_earnings: 0,
            platform_earnings_refunded: 0,
            expected_total: 0,
        }
    }

    /// Append a ledger line; zero amounts are dropped.
    pub fn push(&mut self, user_id: UserId, earning_type: EarningType, amount: i64) {
        if amount != 0 {
            self.entries.push(EarningEntry::new(
                user_id,
                earning_type,
                amount,
                self.currency.clone(),
            ));
        }
    }

    pub fn push_refund(&mut self, user_id: UserId, refund_of: EarningType, amount: i64) {
        if amount != 0 {
            self.entries.push(EarningEntry::refund(
                user_id,
                refund_of,
                amount,
                self.currency.clone(),
            ));
        }
    }

    /// Sum of every entry of the given type.
    pub fn amount_of(&self, earning_type: EarningType) -> i64 {
        self.entries
            .iter()
            .filter(|e| e.earning_type == earning_type)
            .map(|e| e.amount)
            .sum()
    }

    /// Ledger plus net platform share, summed in entry order.
    ///
    /// `None` when any partial sum leaves the i64 range.
    pub fn reconciled_total(&self) -> Option<i64> {
        self.entries
            .iter()
            .try_fold(0i64, |total, e| total.checked_add(e.amount))?
            .checked_add(self.platform_earnings)?
            .checked_sub(self.platform_earnings_refunded)
    }

    /// Verify that every minor unit is accounted for.
    pub fn reconcile(&self, booking_id: BookingId) -> Result<(), CalculationError> {
        let actual = self
            .reconciled_total()
            .ok_or(CalculationError::Overflow {
                booking_id: booking_id.as_i64(),
                quantity: "ledger total",
            })?;
        if actual != self.expected_total {
            return Err(CalculationError::Reconciliation {
                booking_id: booking_id.as_i64(),
                expected: self.expected_total,
                actual,
            });
        }
        Ok(())
    }

    /// Roll the entries up into the booking's aggregate columns.
    pub fn aggregates(&self) -> BookingAggregates {
        let mut agg = BookingAggregates {
            platform_earnings: self.platform_earnings,
            platform_earnings_refunded: self.platform_earnings_refunded,
            ..Default::default()
        };

        for entry in &self.entries {
            match entry.earning_type {
                EarningType::Venue | EarningType::VenuePaid => agg.venue_earnings += entry.amount,
                EarningType::Concierge | EarningType::ConciergeBounty => {
                    agg.concierge_earnings += entry.amount
                }
                EarningType::PartnerVenue => agg.partner_venue_earnings += entry.amount,
                EarningType::PartnerConcierge => agg.partner_concierge_earnings += entry.amount,
                EarningType::Refund => match entry.refund_of {
                    Some(EarningType::Venue) | Some(EarningType::VenuePaid) => {
                        agg.venue_earnings_refunded -= entry.amount
                    }
                    Some(EarningType::Concierge) | Some(EarningType::ConciergeBounty) => {
                        agg.concierge_earnings_refunded -= entry.amount
                    }
                    Some(EarningType::PartnerVenue) | Some(EarningType::PartnerConcierge) => {
                        agg.partner_earnings_refunded -= entry.amount
                    }
                    Some(EarningType::Refund) | None => {}
                },
            }
        }

        agg.total_refunded = agg.venue_earnings_refunded
            + agg.concierge_earnings_refunded
            + agg.partner_earnings_refunded
            + agg.platform_earnings_refunded;
        agg
    }
}
