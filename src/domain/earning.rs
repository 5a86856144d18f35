//! Earning ledger lines.

use crate::domain::{BookingId, Currency, TimeMs, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ledger line type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarningType {
    Venue,
    Concierge,
    ConciergeBounty,
    VenuePaid,
    PartnerVenue,
    PartnerConcierge,
    Refund,
}

impl EarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EarningType::Venue => "venue",
            EarningType::Concierge => "concierge",
            EarningType::ConciergeBounty => "concierge_bounty",
            EarningType::VenuePaid => "venue_paid",
            EarningType::PartnerVenue => "partner_venue",
            EarningType::PartnerConcierge => "partner_concierge",
            EarningType::Refund => "refund",
        }
    }
}

impl fmt::Display for EarningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EarningType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "venue" => Ok(EarningType::Venue),
            "concierge" => Ok(EarningType::Concierge),
            "concierge_bounty" => Ok(EarningType::ConciergeBounty),
            "venue_paid" => Ok(EarningType::VenuePaid),
            "partner_venue" => Ok(EarningType::PartnerVenue),
            "partner_concierge" => Ok(EarningType::PartnerConcierge),
            "refund" => Ok(EarningType::Refund),
            other => Err(format!("unknown earning type: {}", other)),
        }
    }
}

/// A computed, not yet persisted, ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningEntry {
    pub user_id: UserId,
    pub earning_type: EarningType,
    /// Signed amount in minor units of `currency`.
    pub amount: i64,
    pub currency: Currency,
    /// For `refund` lines, the type being reversed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_of: Option<EarningType>,
}

impl EarningEntry {
    pub fn new(user_id: UserId, earning_type: EarningType, amount: i64, currency: Currency) -> Self {
        Self {
            user_id,
            earning_type,
            amount,
            currency,
            refund_of: None,
        }
    }

    pub fn refund(user_id: UserId, refund_of: EarningType, amount: i64, currency: Currency) -> Self {
        Self {
            user_id,
            earning_type: EarningType::Refund,
            amount,
            currency,
            refund_of: Some(refund_of),
        }
    }
}

/// A persisted ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Earning {
    pub id: i64,
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub earning_type: EarningType,
    pub amount: i64,
    pub currency: Currency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_of: Option<EarningType>,
    /// Identifies the replace call that wrote this line.
    pub batch_id: String,
    pub created_at: TimeMs,
}

impl Earning {
    /// Strip persistence metadata, leaving the comparable ledger content.
    pub fn to_entry(&self) -> EarningEntry {
        EarningEntry {
            user_id: self.user_id,
            earning_type: self.earning_type,
            amount: self.amount,
            currency: self.currency.clone(),
            refund_of: self.refund_of,
        }
    }
}
