//! Booking row operations for the repository.

use crate::domain::{Booking, BookingAggregates, BookingId, BookingStatus, Currency, TimeMs};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

use super::{decode_err, NewBooking, Repository};

const BOOKING_COLUMNS: &str = r#"
    id, venue_id, concierge_id, partner_venue_id, partner_concierge_id,
    guest_count, currency, total_fee, is_prime, status, booking_at, refunded_amount,
    venue_earnings, concierge_earnings, partner_venue_earnings, partner_concierge_earnings,
    platform_earnings, venue_earnings_refunded, concierge_earnings_refunded,
    partner_earnings_refunded, platform_earnings_refunded, total_refunded
"#;

impl Repository {
    /// Insert a booking with empty aggregates and return its id.
    pub async fn insert_booking(&self, booking: &NewBooking) -> Result<BookingId, sqlx::Error> {
        let now = chrono::Utc::now().timestamp_millis();
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                venue_id, concierge_id, partner_venue_id, partner_concierge_id,
                guest_count, currency, total_fee, is_prime, status, booking_at,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking.venue_id)
        .bind(booking.concierge_id)
        .bind(booking.partner_venue_id)
        .bind(booking.partner_concierge_id)
        .bind(booking.guest_count)
        .bind(booking.currency.as_str())
        .bind(booking.total_fee)
        .bind(booking.is_prime)
        .bind(booking.status.as_str())
        .bind(booking.booking_at.map(|t| t.as_ms()))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(BookingId::new(result.last_insert_rowid()))
    }

    /// Read a booking with its current aggregate columns.
    pub async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_booking(&mut conn, id).await
    }
}

pub(super) async fn fetch_booking(
    conn: &mut SqliteConnection,
    id: BookingId,
) -> Result<Option<Booking>, sqlx::Error> {
    let sql = format!("SELECT {} FROM bookings WHERE id = ?", BOOKING_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_i64())
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|r| booking_from_row(&r)).transpose()
}

/// Take the write lock on a booking row for the rest of the transaction.
///
/// Bumping `lock_version` makes this the first write of the transaction, so
/// SQLite grants the reserved lock here and concurrent recalculations of the
/// same booking queue behind it. Returns false if the booking does not exist.
pub(super) async fn lock_booking(
    conn: &mut SqliteConnection,
    id: BookingId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE bookings SET lock_version = lock_version + 1 WHERE id = ?")
        .bind(id.as_i64())
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Persist classification, pricing, schedule, and status fields.
pub(super) async fn update_booking_state(
    conn: &mut SqliteConnection,
    booking: &Booking,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE bookings SET
            guest_count = ?, total_fee = ?, is_prime = ?, status = ?,
            booking_at = ?, refunded_amount = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(booking.guest_count)
    .bind(booking.total_fee)
    .bind(booking.is_prime)
    .bind(booking.status.as_str())
    .bind(booking.booking_at.map(|t| t.as_ms()))
    .bind(booking.refunded_amount)
    .bind(chrono::Utc::now().timestamp_millis())
    .bind(booking.id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub(super) async fn write_aggregates(
    conn: &mut SqliteConnection,
    id: BookingId,
    agg: &BookingAggregates,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE bookings SET
            venue_earnings = ?, concierge_earnings = ?,
            partner_venue_earnings = ?, partner_concierge_earnings = ?,
            platform_earnings = ?, venue_earnings_refunded = ?,
            concierge_earnings_refunded = ?, partner_earnings_refunded = ?,
            platform_earnings_refunded = ?, total_refunded = ?
        WHERE id = ?
        "#,
    )
    .bind(agg.venue_earnings)
    .bind(agg.concierge_earnings)
    .bind(agg.partner_venue_earnings)
    .bind(agg.partner_concierge_earnings)
    .bind(agg.platform_earnings)
    .bind(agg.venue_earnings_refunded)
    .bind(agg.concierge_earnings_refunded)
    .bind(agg.partner_earnings_refunded)
    .bind(agg.platform_earnings_refunded)
    .bind(agg.total_refunded)
    .bind(id.as_i64())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking, sqlx::Error> {
    let currency: String = row.get("currency");
    let status: String = row.get("status");

    Ok(Booking {
        id: BookingId::new(row.get("id")),
        venue_id: row.get("venue_id"),
        concierge_id: row.get("concierge_id"),
        partner_venue_id: row.get("partner_venue_id"),
        partner_concierge_id: row.get("partner_concierge_id"),
        guest_count: row.get("guest_count"),
        currency: Currency::from_str(&currency).map_err(decode_err)?,
        total_fee: row.get("total_fee"),
        is_prime: row.get("is_prime"),
        status: BookingStatus::from_str(&status).map_err(decode_err)?,
        booking_at: row.get::<Option<i64>, _>("booking_at").map(TimeMs::new),
        refunded_amount: row.get("refunded_amount"),
        aggregates: BookingAggregates {
            venue_earnings: row.get("venue_earnings"),
            concierge_earnings: row.get("concierge_earnings"),
            partner_venue_earnings: row.get("partner_venue_earnings"),
            partner_concierge_earnings: row.get("partner_concierge_earnings"),
            platform_earnings: row.get("platform_earnings"),
            venue_earnings_refunded: row.get("venue_earnings_refunded"),
            concierge_earnings_refunded: row.get("concierge_earnings_refunded"),
            partner_earnings_refunded: row.get("partner_earnings_refunded"),
            platform_earnings_refunded: row.get("platform_earnings_refunded"),
            total_refunded: row.get("total_refunded"),
        },
    })
}
