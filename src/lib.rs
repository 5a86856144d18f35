pub mod api;
pub mod config;
pub mod currency;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::Config;
pub use currency::{CurrencyConverter, HttpRateSource, RateSource, StaticRateSource};
pub use db::{init_db, Repository};
pub use domain::{
    Booking, BookingClassification, BookingId, BookingStatus, Currency, Earning, EarningType,
    Rate, TimeMs, UserId,
};
pub use engine::{Calculation, EarningsEngine};
pub use error::AppError;
pub use orchestration::{BookingCalculationService, BookingServiceError};
