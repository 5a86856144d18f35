pub mod bookings;
pub mod health;
pub mod users;

use crate::currency::CurrencyConverter;
use crate::db::Repository;
use crate::orchestration::BookingCalculationService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub service: Arc<BookingCalculationService>,
    pub converter: CurrencyConverter,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        service: Arc<BookingCalculationService>,
        converter: CurrencyConverter,
    ) -> Self {
        Self {
            repo,
            service,
            converter,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/bookings/:id", get(bookings::get_booking))
        .route("/v1/bookings/:id/earnings", get(bookings::get_booking_earnings))
        .route("/v1/bookings/:id/calculate", post(bookings::calculate))
        .route(
            "/v1/bookings/:id/convert-to-prime",
            post(bookings::convert_to_prime),
        )
        .route(
            "/v1/bookings/:id/convert-to-non-prime",
            post(bookings::convert_to_non_prime),
        )
        .route("/v1/bookings/:id/modifications", post(bookings::modify))
        .route("/v1/bookings/:id/refunds", post(bookings::refund))
        .route("/v1/bookings/:id/status", post(bookings::update_status))
        .route("/v1/users/:id/earnings", get(users::get_user_earnings))
        .route("/v1/users/:id/earnings.csv", get(users::get_user_earnings_csv))
        .layer(cors)
        .with_state(state)
}
