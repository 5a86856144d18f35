use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::AppState;
use crate::db::CurrencyTotal;
use crate::domain::{Earning, TimeMs, UserId};
use crate::error::AppError;

const CSV_HEADER: &[&str] = &[
    "id",
    "booking_id",
    "type",
    "refund_of",
    "amount",
    "currency",
    "batch_id",
    "created_at",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsQuery {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEarningsResponse {
    pub user_id: UserId,
    pub earnings: Vec<Earning>,
    pub totals: Vec<CurrencyTotal>,
    /// Sum of `totals` in USD minor units.
    pub total_usd: i64,
}

fn parse_window(params: &EarningsQuery) -> Result<(TimeMs, TimeMs), AppError> {
    let from_ms = TimeMs::new(params.from_ms.unwrap_or(0));
    let to_ms = TimeMs::new(params.to_ms.unwrap_or(i64::MAX));
    if from_ms > to_ms {
        return Err(AppError::BadRequest("fromMs must be <= toMs".to_string()));
    }
    Ok((from_ms, to_ms))
}

pub async fn get_user_earnings(
    Path(id): Path<i64>,
    Query(params): Query<EarningsQuery>,
    State(state): State<AppState>,
) -> Result<Json<UserEarningsResponse>, AppError> {
    let user_id = UserId::new(id);
    let (from_ms, to_ms) = parse_window(&params)?;

    let earnings = state.repo.earnings_for_user(user_id, from_ms, to_ms).await?;
    let totals = state
        .repo
        .user_totals_by_currency(user_id, from_ms, to_ms)
        .await?;

    let by_currency: BTreeMap<_, _> = totals
        .iter()
        .map(|t| (t.currency.clone(), t.amount))
        .collect();
    let total_usd = state.converter.convert_to_usd(&by_currency).await;

    Ok(Json(UserEarningsResponse {
        user_id,
        earnings,
        totals,
        total_usd,
    }))
}

pub async fn get_user_earnings_csv(
    Path(id): Path<i64>,
    Query(params): Query<EarningsQuery>,
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let (from_ms, to_ms) = parse_window(&params)?;
    let earnings = state
        .repo
        .earnings_for_user(UserId::new(id), from_ms, to_ms)
        .await?;

    let body = write_earnings_csv(&earnings)
        .map_err(|e| AppError::Internal(format!("CSV export failed: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, "text/csv; charset=utf-8")], body).into_response())
}

fn write_earnings_csv(earnings: &[Earning]) -> Result<Vec<u8>, csv::Error> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    csv.write_record(CSV_HEADER)?;
    for e in earnings {
        csv.write_record(&[
            e.id.to_string(),
            e.booking_id.to_string(),
            e.earning_type.as_str().to_string(),
            e.refund_of.map(|t| t.as_str().to_string()).unwrap_or_default(),
            e.amount.to_string(),
            e.currency.as_str().to_string(),
            e.batch_id.clone(),
            e.created_at.as_ms().to_string(),
        ])?;
    }

    csv.into_inner().map_err(|e| e.into_error().into())
}
