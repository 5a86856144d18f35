//! Booking-scoped write transactions.

use crate::domain::{Booking, BookingAggregates, BookingId, BookingParties};
use crate::engine::Calculation;
use sqlx::{Sqlite, Transaction};

use super::{bookings, earnings, parties, Repository};

/// An open transaction holding the write lock on one booking.
///
/// Dropping it without [`BookingTx::commit`] rolls everything back.
pub struct BookingTx {
    tx: Transaction<'static, Sqlite>,
    booking_id: BookingId,
}

impl Repository {
    /// Begin a transaction and lock the booking row.
    ///
    /// Returns `Ok(None)` if the booking does not exist.
    pub async fn begin_booking(&self, id: BookingId) -> Result<Option<BookingTx>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        if !bookings::lock_booking(&mut tx, id).await? {
            return Ok(None);
        }
        Ok(Some(BookingTx { tx, booking_id: id }))
    }
}

impl BookingTx {
    pub async fn booking(&mut self) -> Result<Booking, sqlx::Error> {
        bookings::fetch_booking(&mut self.tx, self.booking_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn parties(&mut self, booking: &Booking) -> Result<BookingParties, sqlx::Error> {
        parties::fetch_parties(&mut self.tx, booking).await
    }

    pub async fn update_booking(&mut self, booking: &Booking) -> Result<(), sqlx::Error> {
        bookings::update_booking_state(&mut self.tx, booking).await
    }

    /// Atomically swap the booking's ledger for `calculation`.
    pub async fn replace_earnings(
        &mut self,
        calculation: &Calculation,
    ) -> Result<BookingAggregates, sqlx::Error> {
        earnings::replace_earnings(&mut self.tx, self.booking_id, calculation).await
    }

    pub async fn commit(self) -> Result<(), sqlx::Error> {
        self.tx.commit().await
    }
}
