//! Booking entity and its derived earnings aggregates.

use crate::domain::{BookingId, Currency, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    VenueConfirmed,
    PartiallyRefunded,
    NoShow,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::VenueConfirmed => "venue_confirmed",
            BookingStatus::PartiallyRefunded => "partially_refunded",
            BookingStatus::NoShow => "no_show",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    /// Whether the booking currently owes anyone anything.
    ///
    /// Pending and cancelled bookings carry an empty ledger.
    pub fn earns(&self) -> bool {
        !matches!(self, BookingStatus::Pending | BookingStatus::Cancelled)
    }

    /// Whether the booking may still switch between prime and non-prime.
    pub fn is_convertible(&self) -> bool {
        !matches!(
            self,
            BookingStatus::Cancelled | BookingStatus::Refunded | BookingStatus::PartiallyRefunded
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "venue_confirmed" => Ok(BookingStatus::VenueConfirmed),
            "partially_refunded" => Ok(BookingStatus::PartiallyRefunded),
            "no_show" => Ok(BookingStatus::NoShow),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "refunded" => Ok(BookingStatus::Refunded),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Which earnings model a booking follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingClassification {
    /// Guest pays; the fee is split by percentage.
    Prime,
    /// No guest charge; the venue pays a per-guest bounty.
    NonPrime,
}

impl BookingClassification {
    pub fn from_is_prime(is_prime: bool) -> Self {
        if is_prime {
            BookingClassification::Prime
        } else {
            BookingClassification::NonPrime
        }
    }

    pub fn is_prime(&self) -> bool {
        matches!(self, BookingClassification::Prime)
    }
}

impl fmt::Display for BookingClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingClassification::Prime => f.write_str("prime"),
            BookingClassification::NonPrime => f.write_str("non_prime"),
        }
    }
}

/// Roll-up columns stored on the booking row.
///
/// Always derived from the current ledger; never patched incrementally.
/// Refund columns hold non-negative magnitudes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingAggregates {
    pub venue_earnings: i64,
    pub concierge_earnings: i64,
    pub partner_venue_earnings: i64,
    pub partner_concierge_earnings: i64,
    pub platform_earnings: i64,
    pub venue_earnings_refunded: i64,
    pub concierge_earnings_refunded: i64,
    pub partner_earnings_refunded: i64,
    pub platform_earnings_refunded: i64,
    pub total_refunded: i64,
}

impl BookingAggregates {
    /// Gross earnings across every party, before refunds.
    pub fn gross_total(&self) -> i64 {
        self.venue_earnings
            + self.concierge_earnings
            + self.partner_venue_earnings
            + self.partner_concierge_earnings
            + self.platform_earnings
    }
}

/// A reservation and everything the earnings engine needs to price it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub venue_id: i64,
    pub concierge_id: i64,
    pub partner_venue_id: Option<i64>,
    pub partner_concierge_id: Option<i64>,
    pub guest_count: i64,
    pub currency: Currency,
    /// Guest-paid fee in minor units; always 0 for non-prime bookings.
    pub total_fee: i64,
    pub is_prime: bool,
    pub status: BookingStatus,
    pub booking_at: Option<TimeMs>,
    /// Cumulative refunded amount in minor units.
    pub refunded_amount: i64,
    pub aggregates: BookingAggregates,
}

impl Booking {
    pub fn classification(&self) -> BookingClassification {
        BookingClassification::from_is_prime(self.is_prime)
    }
}
