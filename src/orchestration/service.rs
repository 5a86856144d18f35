use crate::db::{BookingTx, Repository};
use crate::domain::{Booking, BookingClassification, BookingId, BookingStatus, TimeMs};
use crate::engine::{Calculation, CalculationError, EarningsEngine, MissingConfigurationError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Entry point for every booking lifecycle event that affects earnings.
///
/// Each operation runs in a single transaction that starts by locking the
/// booking row; any error rolls the whole operation back and leaves the
/// previous ledger in place.
#[derive(Clone)]
pub struct BookingCalculationService {
    repo: Arc<Repository>,
    engine: EarningsEngine,
}

/// Booking state and ledger after a successful operation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationOutcome {
    pub booking: Booking,
    pub calculation: Calculation,
}

/// Changes approved after the booking was created.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingModification {
    pub guest_count: Option<i64>,
    pub booking_at: Option<TimeMs>,
    /// Explicit new guest fee; prime only.
    pub total_fee: Option<i64>,
}

#[derive(Debug, Error)]
pub enum BookingServiceError {
    #[error("booking {0} not found")]
    NotFound(BookingId),
    #[error("invalid classification change: {0}")]
    InvalidClassification(String),
    #[error("invalid refund: {0}")]
    InvalidRefund(String),
    #[error("invalid modification: {0}")]
    InvalidModification(String),
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

impl From<MissingConfigurationError> for BookingServiceError {
    fn from(err: MissingConfigurationError) -> Self {
        BookingServiceError::Calculation(err.into())
    }
}

impl BookingCalculationService {
    pub fn new(repo: Arc<Repository>, engine: EarningsEngine) -> Self {
        Self { repo, engine }
    }

    /// Regenerate the booking's ledger from its current state.
    ///
    /// Idempotent: the previous ledger is replaced, never appended to.
    pub async fn calculate_earnings(
        &self,
        id: BookingId,
    ) -> Result<CalculationOutcome, BookingServiceError> {
        let mut tx = self.begin(id).await?;
        let booking = tx.booking().await?;
        let outcome = self.recalculate_in(&mut tx, booking).await?;
        tx.commit().await?;

        log_outcome("Earnings calculated", &outcome);
        Ok(outcome)
    }

    /// Switch a prime booking to non-prime.
    ///
    /// Clears the ledger and forces `total_fee` to 0; the caller recalculates.
    pub async fn convert_to_non_prime(&self, id: BookingId) -> Result<Booking, BookingServiceError> {
        let mut tx = self.begin(id).await?;
        let mut booking = tx.booking().await?;
        ensure_convertible(&booking, BookingClassification::NonPrime)?;

        booking.is_prime = false;
        booking.total_fee = 0;
        self.reset_ledger(&mut tx, &mut booking).await?;
        tx.commit().await?;

        info!(booking_id = %id, "Booking converted to non-prime");
        Ok(booking)
    }

    /// Switch a non-prime booking to prime, pricing it from the venue's
    /// per-guest fee template.
    ///
    /// Clears the ledger; the caller recalculates.
    pub async fn convert_to_prime(&self, id: BookingId) -> Result<Booking, BookingServiceError> {
        let mut tx = self.begin(id).await?;
        let mut booking = tx.booking().await?;
        ensure_convertible(&booking, BookingClassification::Prime)?;

        booking.total_fee = self.template_fee(&mut tx, &booking).await?.ok_or_else(|| {
            BookingServiceError::InvalidClassification(format!(
                "fee template for {} guests exceeds the representable amount",
                booking.guest_count
            ))
        })?;
        booking.is_prime = true;
        self.reset_ledger(&mut tx, &mut booking).await?;
        tx.commit().await?;

        info!(booking_id = %id, total_fee = booking.total_fee, "Booking converted to prime");
        Ok(booking)
    }

    /// Apply an approved modification and regenerate the ledger.
    ///
    /// A prime booking whose guest count changes without an explicit fee is
    /// repriced from the venue's fee template. A booking that already carries
    /// refunds has its refund status re-derived against the new fee.
    pub async fn recalculate_on_modification(
        &self,
        id: BookingId,
        modification: &BookingModification,
    ) -> Result<CalculationOutcome, BookingServiceError> {
        let mut tx = self.begin(id).await?;
        let mut booking = tx.booking().await?;
        validate_modification(&booking, modification)?;

        let guests_changed = modification
            .guest_count
            .is_some_and(|g| g != booking.guest_count);
        if let Some(guest_count) = modification.guest_count {
            booking.guest_count = guest_count;
        }
        if let Some(booking_at) = modification.booking_at {
            booking.booking_at = Some(booking_at);
        }
        if let Some(total_fee) = modification.total_fee {
            booking.total_fee = total_fee;
        } else if booking.is_prime && guests_changed {
            booking.total_fee = self.template_fee(&mut tx, &booking).await?.ok_or_else(|| {
                BookingServiceError::InvalidModification(format!(
                    "fee for {} guests exceeds the representable amount",
                    booking.guest_count
                ))
            })?;
        }
        if booking.total_fee < booking.refunded_amount {
            return Err(BookingServiceError::InvalidModification(format!(
                "total fee {} is below the {} already refunded",
                booking.total_fee, booking.refunded_amount
            )));
        }
        if booking.refunded_amount > 0 {
            booking.status = refund_status(booking.refunded_amount, booking.total_fee);
        }

        tx.update_booking(&booking).await?;
        let outcome = self
            .recalculate_in(&mut tx, booking)
            .await
            .map_err(|err| match err {
                BookingServiceError::Calculation(CalculationError::Overflow { .. }) => {
                    BookingServiceError::InvalidModification(err.to_string())
                }
                other => other,
            })?;
        tx.commit().await?;

        log_outcome("Earnings recalculated after modification", &outcome);
        Ok(outcome)
    }

    /// Record a guest refund on a prime booking and regenerate the ledger.
    pub async fn refund_booking(
        &self,
        id: BookingId,
        amount: i64,
    ) -> Result<CalculationOutcome, BookingServiceError> {
        let mut tx = self.begin(id).await?;
        let mut booking = tx.booking().await?;

        if !booking.is_prime {
            return Err(BookingServiceError::InvalidRefund(
                "non-prime bookings have no guest payment".to_string(),
            ));
        }
        if !booking.status.earns() {
            return Err(BookingServiceError::InvalidRefund(format!(
                "booking is {}",
                booking.status
            )));
        }
        if amount <= 0 {
            return Err(BookingServiceError::InvalidRefund(
                "amount must be positive".to_string(),
            ));
        }
        let refunded = booking
            .refunded_amount
            .checked_add(amount)
            .filter(|refunded| *refunded <= booking.total_fee);
        let Some(refunded) = refunded else {
            return Err(BookingServiceError::InvalidRefund(format!(
                "refunding {} would exceed the fee of {} ({} already refunded)",
                amount, booking.total_fee, booking.refunded_amount
            )));
        };

        booking.refunded_amount = refunded;
        booking.status = refund_status(refunded, booking.total_fee);
        tx.update_booking(&booking).await?;
        let outcome = self.recalculate_in(&mut tx, booking).await?;
        tx.commit().await?;

        log_outcome("Earnings recalculated after refund", &outcome);
        Ok(outcome)
    }

    /// Move a booking to a new lifecycle status and regenerate the ledger.
    ///
    /// Refund statuses are reached only through [`Self::refund_booking`].
    pub async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<CalculationOutcome, BookingServiceError> {
        if matches!(
            status,
            BookingStatus::Refunded | BookingStatus::PartiallyRefunded
        ) {
            return Err(BookingServiceError::InvalidModification(format!(
                "status {} is set by refunds",
                status
            )));
        }

        let mut tx = self.begin(id).await?;
        let mut booking = tx.booking().await?;
        if booking.refunded_amount > 0 && status != BookingStatus::Cancelled {
            return Err(BookingServiceError::InvalidModification(format!(
                "refunded booking cannot move to {}",
                status
            )));
        }

        booking.status = status;
        tx.update_booking(&booking).await?;
        let outcome = self.recalculate_in(&mut tx, booking).await?;
        tx.commit().await?;

        log_outcome("Earnings recalculated after status change", &outcome);
        Ok(outcome)
    }

    async fn begin(&self, id: BookingId) -> Result<BookingTx, BookingServiceError> {
        self.repo
            .begin_booking(id)
            .await?
            .ok_or(BookingServiceError::NotFound(id))
    }

    async fn recalculate_in(
        &self,
        tx: &mut BookingTx,
        mut booking: Booking,
    ) -> Result<CalculationOutcome, BookingServiceError> {
        let parties = tx.parties(&booking).await?;
        let calculation = self.engine.calculate(&booking, &parties)?;
        booking.aggregates = tx.replace_earnings(&calculation).await?;
        Ok(CalculationOutcome {
            booking,
            calculation,
        })
    }

    async fn reset_ledger(
        &self,
        tx: &mut BookingTx,
        booking: &mut Booking,
    ) -> Result<(), BookingServiceError> {
        tx.update_booking(booking).await?;
        let empty = Calculation::empty(booking.classification(), &booking.currency);
        booking.aggregates = tx.replace_earnings(&empty).await?;
        Ok(())
    }

    /// `Ok(None)` when the templated fee does not fit in an i64.
    async fn template_fee(
        &self,
        tx: &mut BookingTx,
        booking: &Booking,
    ) -> Result<Option<i64>, BookingServiceError> {
        let venue = tx.parties(booking).await?.venue;
        let per_head = venue.prime_fee_per_head.ok_or_else(|| {
            MissingConfigurationError::new("venue", venue.id, "prime_fee_per_head")
        })?;
        Ok(per_head.checked_mul(booking.guest_count))
    }
}

fn ensure_convertible(
    booking: &Booking,
    target: BookingClassification,
) -> Result<(), BookingServiceError> {
    if booking.classification() == target {
        return Err(BookingServiceError::InvalidClassification(format!(
            "booking {} is already {}",
            booking.id, target
        )));
    }
    if !booking.status.is_convertible() {
        return Err(BookingServiceError::InvalidClassification(format!(
            "booking {} is {}",
            booking.id, booking.status
        )));
    }
    Ok(())
}

/// `refunded` of `total_fee` returned to the guest; `refunded` must be positive.
fn refund_status(refunded: i64, total_fee: i64) -> BookingStatus {
    if refunded == total_fee {
        BookingStatus::Refunded
    } else {
        BookingStatus::PartiallyRefunded
    }
}

fn validate_modification(
    booking: &Booking,
    modification: &BookingModification,
) -> Result<(), BookingServiceError> {
    if booking.status == BookingStatus::Cancelled {
        return Err(BookingServiceError::InvalidModification(format!(
            "booking {} is cancelled",
            booking.id
        )));
    }
    if modification.guest_count.is_some_and(|g| g < 0) {
        return Err(BookingServiceError::InvalidModification(
            "guest count cannot be negative".to_string(),
        ));
    }
    match modification.total_fee {
        Some(fee) if fee < 0 => Err(BookingServiceError::InvalidModification(
            "total fee cannot be negative".to_string(),
        )),
        Some(fee) if fee != 0 && !booking.is_prime => {
            Err(BookingServiceError::InvalidModification(
                "non-prime bookings carry no guest fee".to_string(),
            ))
        }
        _ => Ok(()),
    }
}

fn log_outcome(message: &str, outcome: &CalculationOutcome) {
    info!(
        booking_id = %outcome.booking.id,
        classification = %outcome.calculation.classification,
        status = %outcome.booking.status,
        entries = outcome.calculation.entries.len(),
        platform_earnings = outcome.calculation.platform_earnings,
        "{}",
        message
    );
}
