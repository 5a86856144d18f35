//! Payout configuration owned by venues, concierges, and partners.
//!
//! Optional fields are configured per entity; the rate resolver decides
//! which of them a given booking actually requires.

use crate::domain::{Rate, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: i64,
    /// Operator account that receives venue earnings.
    pub user_id: UserId,
    pub name: String,
    pub payout_venue: Option<Rate>,
    /// Minor units charged to the venue per guest on non-prime bookings.
    pub non_prime_fee_per_head: Option<i64>,
    /// Minor units charged to the guest per head on prime bookings.
    pub prime_fee_per_head: Option<i64>,
    pub is_omakase: bool,
    /// Flat concierge fee per guest when `is_omakase` is set.
    pub omakase_concierge_fee: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concierge {
    pub id: i64,
    pub user_id: UserId,
    pub payout_percentage: Option<Rate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub id: i64,
    pub user_id: UserId,
    pub percentage: Option<Rate>,
}

/// Every party referenced by one booking, loaded together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingParties {
    pub venue: Venue,
    pub concierge: Concierge,
    pub partner_venue: Option<Partner>,
    pub partner_concierge: Option<Partner>,
}
