//! Revenue sharing between clinic and doctor.
//!
//! Pipeline: Appointment → Split Lookup → Net Amount → Shares → Payment Record

mod calculator;

pub use calculator::*;

use thiserror::Error;

/// Billing errors.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(i64),
}

pub type BillingResult<T> = Result<T, BillingError>;
