//! User, venue, concierge, and partner operations for the repository.

use crate::domain::{Booking, BookingParties, Concierge, Partner, Rate, UserId, Venue};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use super::{parse_rate, NewVenue, Repository};

impl Repository {
    /// Insert a user and return its id.
    pub async fn insert_user(&self, name: &str) -> Result<UserId, sqlx::Error> {
        let result = sqlx::query("INSERT INTO users (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(UserId::new(result.last_insert_rowid()))
    }

    /// Insert a venue operated by `user_id` and return its id.
    pub async fn insert_venue(&self, user_id: UserId, venue: &NewVenue) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO venues (
                user_id, name, payout_venue, non_prime_fee_per_head,
                prime_fee_per_head, is_omakase, omakase_concierge_fee
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id.as_i64())
        .bind(&venue.name)
        .bind(venue.payout_venue.map(|r| r.to_percent_string()))
        .bind(venue.non_prime_fee_per_head)
        .bind(venue.prime_fee_per_head)
        .bind(venue.is_omakase)
        .bind(venue.omakase_concierge_fee)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_concierge(
        &self,
        user_id: UserId,
        payout_percentage: Option<Rate>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO concierges (user_id, payout_percentage) VALUES (?, ?)")
            .bind(user_id.as_i64())
            .bind(payout_percentage.map(|r| r.to_percent_string()))
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn insert_partner(
        &self,
        user_id: UserId,
        percentage: Option<Rate>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO partners (user_id, percentage) VALUES (?, ?)")
            .bind(user_id.as_i64())
            .bind(percentage.map(|r| r.to_percent_string()))
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    /// Change a venue's percentage payout. `None` clears it.
    pub async fn update_venue_payout(
        &self,
        venue_id: i64,
        payout_venue: Option<Rate>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE venues SET payout_venue = ? WHERE id = ?")
            .bind(payout_venue.map(|r| r.to_percent_string()))
            .bind(venue_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Change a concierge's percentage payout. `None` clears it.
    pub async fn update_concierge_payout(
        &self,
        concierge_id: i64,
        payout_percentage: Option<Rate>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE concierges SET payout_percentage = ? WHERE id = ?")
            .bind(payout_percentage.map(|r| r.to_percent_string()))
            .bind(concierge_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_venue(&self, venue_id: i64) -> Result<Option<Venue>, sqlx::Error> {
        let mut conn = self.pool.acquire().await?;
        fetch_venue(&mut conn, venue_id).await
    }
}

/// Load every party a booking references.
pub(super) async fn fetch_parties(
    conn: &mut SqliteConnection,
    booking: &Booking,
) -> Result<BookingParties, sqlx::Error> {
    let venue = fetch_venue(conn, booking.venue_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let concierge = fetch_concierge(conn, booking.concierge_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let partner_venue = match booking.partner_venue_id {
        Some(id) => Some(fetch_partner(conn, id).await?.ok_or(sqlx::Error::RowNotFound)?),
        None => None,
    };
    let partner_concierge = match booking.partner_concierge_id {
        Some(id) => Some(fetch_partner(conn, id).await?.ok_or(sqlx::Error::RowNotFound)?),
        None => None,
    };

    Ok(BookingParties {
        venue,
        concierge,
        partner_venue,
        partner_concierge,
    })
}

pub(super) async fn fetch_venue(
    conn: &mut SqliteConnection,
    venue_id: i64,
) -> Result<Option<Venue>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, name, payout_venue, non_prime_fee_per_head,
               prime_fee_per_head, is_omakase, omakase_concierge_fee
        FROM venues
        WHERE id = ?
        "#,
    )
    .bind(venue_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|r| venue_from_row(&r)).transpose()
}

async fn fetch_concierge(
    conn: &mut SqliteConnection,
    concierge_id: i64,
) -> Result<Option<Concierge>, sqlx::Error> {
    let row = sqlx::query("SELECT id, user_id, payout_percentage FROM concierges WHERE id = ?")
        .bind(concierge_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|r| {
        Ok(Concierge {
            id: r.get("id"),
            user_id: UserId::new(r.get("user_id")),
            payout_percentage: parse_rate(r.get("payout_percentage"))?,
        })
    })
    .transpose()
}

async fn fetch_partner(
    conn: &mut SqliteConnection,
    partner_id: i64,
) -> Result<Option<Partner>, sqlx::Error> {
    let row = sqlx::query("SELECT id, user_id, percentage FROM partners WHERE id = ?")
        .bind(partner_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(|r| {
        Ok(Partner {
            id: r.get("id"),
            user_id: UserId::new(r.get("user_id")),
            percentage: parse_rate(r.get("percentage"))?,
        })
    })
    .transpose()
}

fn venue_from_row(row: &SqliteRow) -> Result<Venue, sqlx::Error> {
    Ok(Venue {
        id: row.get("id"),
        user_id: UserId::new(row.get("user_id")),
        name: row.get("name"),
        payout_venue: parse_rate(row.get("payout_venue"))?,
        non_prime_fee_per_head: row.get("non_prime_fee_per_head"),
        prime_fee_per_head: row.get("prime_fee_per_head"),
        is_omakase: row.get("is_omakase"),
        omakase_concierge_fee: row.get("omakase_concierge_fee"),
    })
}
