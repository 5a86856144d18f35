//! Earnings ledger writes and reporting reads.

use crate::domain::{BookingAggregates, BookingId, Currency, Earning, EarningType, TimeMs, UserId};
use crate::engine::Calculation;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use std::str::FromStr;

use super::bookings::write_aggregates;
use super::{decode_err, CurrencyTotal, Repository};

/// Replace the whole ledger of one booking with `calculation`.
///
/// Runs on the caller's transaction: existing rows are deleted, the new
/// non-zero entries are inserted under a fresh batch id, and the booking's
/// aggregate columns are rewritten from the same entries. Returns the
/// aggregates that were written.
pub(super) async fn replace_earnings(
    conn: &mut SqliteConnection,
    booking_id: BookingId,
    calculation: &Calculation,
) -> Result<BookingAggregates, sqlx::Error> {
    sqlx::query("DELETE FROM earnings WHERE booking_id = ?")
        .bind(booking_id.as_i64())
        .execute(&mut *conn)
        .await?;

    let batch_id = uuid::Uuid::new_v4().to_string();
    let created_at = chrono::Utc::now().timestamp_millis();

    for entry in calculation.entries.iter().filter(|e| e.amount != 0) {
        sqlx::query(
            r#"
            INSERT INTO earnings
            (booking_id, user_id, type, amount, currency, refund_of, batch_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(booking_id.as_i64())
        .bind(entry.user_id.as_i64())
        .bind(entry.earning_type.as_str())
        .bind(entry.amount)
        .bind(entry.currency.as_str())
        .bind(entry.refund_of.map(|t| t.as_str()))
        .bind(&batch_id)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;
    }

    let aggregates = calculation.aggregates();
    write_aggregates(conn, booking_id, &aggregates).await?;
    Ok(aggregates)
}

impl Repository {
    /// All ledger lines for a booking, oldest first.
    pub async fn earnings_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<Earning>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, booking_id, user_id, type, amount, currency, refund_of, batch_id, created_at
            FROM earnings
            WHERE booking_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(booking_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(earning_from_row).collect()
    }

    /// Ledger lines paid to a user on bookings scheduled within `[from_ms, to_ms]`.
    pub async fn earnings_for_user(
        &self,
        user_id: UserId,
        from_ms: TimeMs,
        to_ms: TimeMs,
    ) -> Result<Vec<Earning>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT e.id, e.booking_id, e.user_id, e.type, e.amount, e.currency,
                   e.refund_of, e.batch_id, e.created_at
            FROM earnings e
            JOIN bookings b ON b.id = e.booking_id
            WHERE e.user_id = ?
              AND COALESCE(b.booking_at, b.created_at) >= ?
              AND COALESCE(b.booking_at, b.created_at) <= ?
            ORDER BY COALESCE(b.booking_at, b.created_at) ASC, e.id ASC
            "#,
        )
        .bind(user_id.as_i64())
        .bind(from_ms.as_ms())
        .bind(to_ms.as_ms())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(earning_from_row).collect()
    }

    /// Net totals per currency for a user over the same window as
    /// [`Repository::earnings_for_user`].
    pub async fn user_totals_by_currency(
        &self,
        user_id: UserId,
        from_ms: TimeMs,
        to_ms: TimeMs,
    ) -> Result<Vec<CurrencyTotal>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT e.currency, SUM(e.amount) AS amount, COUNT(*) AS entry_count
            FROM earnings e
            JOIN bookings b ON b.id = e.booking_id
            WHERE e.user_id = ?
              AND COALESCE(b.booking_at, b.created_at) >= ?
              AND COALESCE(b.booking_at, b.created_at) <= ?
            GROUP BY e.currency
            ORDER BY e.currency ASC
            "#,
        )
        .bind(user_id.as_i64())
        .bind(from_ms.as_ms())
        .bind(to_ms.as_ms())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|r| {
                let currency: String = r.get("currency");
                Ok(CurrencyTotal {
                    currency: Currency::from_str(&currency).map_err(decode_err)?,
                    amount: r.get("amount"),
                    entry_count: r.get("entry_count"),
                })
            })
            .collect()
    }

    /// Number of distinct replace batches currently in a booking's ledger.
    ///
    /// Always 0 or 1 while the ledger writer is the only writer.
    pub async fn ledger_batch_count(&self, booking_id: BookingId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(DISTINCT batch_id) AS batches FROM earnings WHERE booking_id = ?",
        )
        .bind(booking_id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("batches"))
    }
}

fn earning_from_row(row: &SqliteRow) -> Result<Earning, sqlx::Error> {
    let earning_type: String = row.get("type");
    let currency: String = row.get("currency");
    let refund_of: Option<String> = row.get("refund_of");

    Ok(Earning {
        id: row.get("id"),
        booking_id: BookingId::new(row.get("booking_id")),
        user_id: UserId::new(row.get("user_id")),
        earning_type: EarningType::from_str(&earning_type).map_err(decode_err)?,
        amount: row.get("amount"),
        currency: Currency::from_str(&currency).map_err(decode_err)?,
        refund_of: refund_of
            .map(|s| EarningType::from_str(&s).map_err(decode_err))
            .transpose()?,
        batch_id: row.get("batch_id"),
        created_at: TimeMs::new(row.get("created_at")),
    })
}
