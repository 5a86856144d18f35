//! Concierge promotional multiplier.

use crate::domain::{Booking, TimeMs};
use serde::{Deserialize, Serialize};

/// Concierge earnings are multiplied by this inside the promotional window.
pub const CONCIERGE_PROMO_MULTIPLIER: i64 = 2;

/// Inclusive time window during which prime concierge earnings are doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionWindow {
    pub start: TimeMs,
    pub end: TimeMs,
}

impl PromotionWindow {
    pub fn new(start: TimeMs, end: TimeMs) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, at: TimeMs) -> bool {
        self.start <= at && at <= self.end
    }

    /// True for prime bookings scheduled inside the window.
    ///
    /// A booking without a scheduled time never qualifies.
    pub fn qualifies(&self, booking: &Booking) -> bool {
        booking.is_prime && booking.booking_at.is_some_and(|at| self.contains(at))
    }

    /// `None` when the doubled amount does not fit in an i64.
    pub fn apply(&self, amount: i64, booking: &Booking) -> Option<i64> {
        if self.qualifies(booking) {
            amount.checked_mul(CONCIERGE_PROMO_MULTIPLIER)
        } else {
            Some(amount)
        }
    }
}
