//! Database module for SQLite operations.
//!
//! This module provides:
//! - Database initialization and migrations
//! - SQLite pragma configuration
//! - Repository layer for bookings, payees, and the earnings ledger

pub mod migrations;
pub mod repo;

pub use migrations::init_db;
pub use repo::{BookingTx, CurrencyTotal, NewBooking, NewVenue, Repository};
