//! Booking lifecycle orchestration over the earnings engine and ledger.

pub mod service;

pub use service::{
    BookingCalculationService, BookingModification, BookingServiceError, CalculationOutcome,
};
