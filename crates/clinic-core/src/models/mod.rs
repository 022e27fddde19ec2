//! Domain models for the clinic.

mod appointment;
mod doctor;
mod patient;
mod payment;
mod treatment;

pub use appointment::*;
pub use doctor::*;
pub use patient::*;
pub use payment::*;
pub use treatment::*;
