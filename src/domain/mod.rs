//! Domain types for the booking earnings ledger.
//!
//! This module provides:
//! - Identifier and time primitives: BookingId, UserId, TimeMs, Currency
//! - Rate handling via the Rate wrapper and minor-unit rounding
//! - Booking, Earning, and payee configuration types

pub mod booking;
pub mod earning;
pub mod payee;
pub mod primitives;
pub mod rate;

pub use booking::{Booking, BookingAggregates, BookingClassification, BookingStatus};
pub use earning::{Earning, EarningEntry, EarningType};
pub use payee::{BookingParties, Concierge, Partner, Venue};
pub use primitives::{BookingId, Currency, TimeMs, UserId};
pub use rate::{round_minor, Rate};
