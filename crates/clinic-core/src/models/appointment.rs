//! Appointment models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Appointment status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AppointmentStatus {
    /// Booked and confirmed with the patient
    Confirmed,
    /// Cancelled by either side
    Cancelled,
    /// Awaiting confirmation
    Pending,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "pending" => Ok(AppointmentStatus::Pending),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

/// A scheduled visit linking a patient, a doctor and a treatment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    /// Row ID - assigned by the store on insert
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub treatment_id: i64,
    /// Scheduled date and time (clinic local time)
    pub scheduled_at: NaiveDateTime,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

impl Appointment {
    /// Create a new, unsaved appointment in the pending state.
    pub fn new(
        patient_id: i64,
        doctor_id: i64,
        treatment_id: i64,
        scheduled_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: 0,
            patient_id,
            doctor_id,
            treatment_id,
            scheduled_at,
            status: AppointmentStatus::Pending,
            notes: None,
        }
    }
}

/// Appointment joined with display names of its related records.
///
/// Names are `None` when the referenced row is missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub treatment_name: Option<String>,
}

impl AppointmentDetail {
    /// Label used by selection lists, e.g. `"12 - Sara"`.
    pub fn label(&self) -> String {
        format!(
            "{} - {}",
            self.appointment.id,
            self.patient_name.as_deref().unwrap_or("unknown")
        )
    }
}
