//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `parties.rs` - Users, venues, concierges, and partners
//! - `bookings.rs` - Booking rows and their aggregate columns
//! - `earnings.rs` - The earnings ledger and its reporting reads
//! - `tx.rs` - Booking-scoped write transactions

mod bookings;
mod earnings;
mod parties;
mod tx;

use crate::domain::{BookingStatus, Currency, Rate, TimeMs};
use serde::Serialize;
use sqlx::sqlite::SqlitePool;

pub use tx::BookingTx;

/// Venue settings accepted by [`Repository::insert_venue`].
#[derive(Debug, Clone, Default)]
pub struct NewVenue {
    pub name: String,
    pub payout_venue: Option<Rate>,
    pub non_prime_fee_per_head: Option<i64>,
    pub prime_fee_per_head: Option<i64>,
    pub is_omakase: bool,
    pub omakase_concierge_fee: Option<i64>,
}

/// Booking fields accepted by [`Repository::insert_booking`].
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub venue_id: i64,
    pub concierge_id: i64,
    pub partner_venue_id: Option<i64>,
    pub partner_concierge_id: Option<i64>,
    pub guest_count: i64,
    pub currency: Currency,
    pub total_fee: i64,
    pub is_prime: bool,
    pub status: BookingStatus,
    pub booking_at: Option<TimeMs>,
}

/// Per-currency totals for one payee, in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyTotal {
    pub currency: Currency,
    pub amount: i64,
    pub entry_count: i64,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode_err<E>(err: E) -> sqlx::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    sqlx::Error::Decode(err.into())
}

fn parse_rate(value: Option<String>) -> Result<Option<Rate>, sqlx::Error> {
    value
        .map(|s| Rate::parse_percent(&s).map_err(decode_err))
        .transpose()
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::UserId;
    use std::str::FromStr;
    use tempfile::TempDir;

    pub struct Seeded {
        pub venue_user: UserId,
        pub concierge_user: UserId,
        pub partner_user: UserId,
        pub venue_id: i64,
        pub concierge_id: i64,
        pub partner_id: i64,
    }

    pub async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    pub async fn seed_parties(repo: &Repository) -> Seeded {
        let venue_user = repo.insert_user("Venue Operator").await.unwrap();
        let concierge_user = repo.insert_user("Concierge").await.unwrap();
        let partner_user = repo.insert_user("Partner").await.unwrap();

        let venue_id = repo
            .insert_venue(
                venue_user,
                &NewVenue {
                    name: "Test Venue".to_string(),
                    payout_venue: Some(Rate::parse_percent("60").unwrap()),
                    non_prime_fee_per_head: Some(1000),
                    prime_fee_per_head: Some(10000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let concierge_id = repo
            .insert_concierge(concierge_user, Some(Rate::parse_percent("10").unwrap()))
            .await
            .unwrap();
        let partner_id = repo
            .insert_partner(partner_user, Some(Rate::parse_percent("6").unwrap()))
            .await
            .unwrap();

        Seeded {
            venue_user,
            concierge_user,
            partner_user,
            venue_id,
            concierge_id,
            partner_id,
        }
    }

    pub fn new_booking(seeded: &Seeded, total_fee: i64) -> NewBooking {
        NewBooking {
            venue_id: seeded.venue_id,
            concierge_id: seeded.concierge_id,
            partner_venue_id: None,
            partner_concierge_id: None,
            guest_count: 2,
            currency: Currency::from_str("USD").unwrap(),
            total_fee,
            is_prime: true,
            status: BookingStatus::Confirmed,
            booking_at: Some(TimeMs::new(1_000)),
        }
    }
}
