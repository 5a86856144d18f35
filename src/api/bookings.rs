use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Booking, BookingAggregates, BookingId, BookingStatus, Currency, Earning};
use crate::error::AppError;
use crate::orchestration::{BookingModification, CalculationOutcome};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEarningsResponse {
    pub booking_id: BookingId,
    pub currency: Currency,
    pub aggregates: BookingAggregates,
    pub earnings: Vec<Earning>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub amount: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: BookingStatus,
}

async fn load_booking(state: &AppState, id: BookingId) -> Result<Booking, AppError> {
    state
        .repo
        .get_booking(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("booking {}", id)))
}

pub async fn get_booking(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(load_booking(&state, BookingId::new(id)).await?))
}

pub async fn get_booking_earnings(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<BookingEarningsResponse>, AppError> {
    let booking = load_booking(&state, BookingId::new(id)).await?;
    let earnings = state.repo.earnings_for_booking(booking.id).await?;

    Ok(Json(BookingEarningsResponse {
        booking_id: booking.id,
        currency: booking.currency,
        aggregates: booking.aggregates,
        earnings,
    }))
}

pub async fn calculate(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let outcome = state.service.calculate_earnings(BookingId::new(id)).await?;
    Ok(Json(outcome))
}

pub async fn convert_to_prime(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let id = BookingId::new(id);
    state.service.convert_to_prime(id).await?;
    Ok(Json(state.service.calculate_earnings(id).await?))
}

pub async fn convert_to_non_prime(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let id = BookingId::new(id);
    state.service.convert_to_non_prime(id).await?;
    Ok(Json(state.service.calculate_earnings(id).await?))
}

pub async fn modify(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(modification): Json<BookingModification>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let outcome = state
        .service
        .recalculate_on_modification(BookingId::new(id), &modification)
        .await?;
    Ok(Json(outcome))
}

pub async fn refund(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(request): Json<RefundRequest>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let outcome = state
        .service
        .refund_booking(BookingId::new(id), request.amount)
        .await?;
    Ok(Json(outcome))
}

pub async fn update_status(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<CalculationOutcome>, AppError> {
    let outcome = state
        .service
        .update_status(BookingId::new(id), request.status)
        .await?;
    Ok(Json(outcome))
}
