use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::engine::CalculationError;
use crate::orchestration::BookingServiceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unprocessable: {0}")]
    Unprocessable(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<BookingServiceError> for AppError {
    fn from(err: BookingServiceError) -> Self {
        match err {
            BookingServiceError::NotFound(id) => AppError::NotFound(format!("booking {}", id)),
            BookingServiceError::InvalidClassification(_) | BookingServiceError::InvalidRefund(_) => {
                AppError::Conflict(err.to_string())
            }
            BookingServiceError::InvalidModification(_) => AppError::BadRequest(err.to_string()),
            BookingServiceError::Calculation(
                CalculationError::MissingConfiguration(_) | CalculationError::Overflow { .. },
            ) => AppError::Unprocessable(err.to_string()),
            BookingServiceError::Calculation(CalculationError::Reconciliation { .. })
            | BookingServiceError::Db(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
