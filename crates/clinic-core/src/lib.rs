//! Clinic Core Library
//!
//! Local records store for a single clinic, with revenue sharing between the
//! clinic and its doctors.
//!
//! # Architecture
//!
//! ```text
//!   Patients   Doctors   Treatments ── Split Configuration
//!       │         │          │           (treatment, doctor)
//!       └─────────┼──────────┘                  │
//!                 ▼                             │
//!           Appointment                         │
//!                 │                             │
//!                 ▼                             ▼
//!        ┌──────────────────────────────────────────────┐
//!        │               Share Calculator               │
//!        │  net = total - discounts + taxes             │
//!        │  clinic = net * clinic% / 100                │
//!        │  doctor = net * doctor% / 100                │
//!        └───────────────────────┬──────────────────────┘
//!                                ▼
//!                             Payment
//!                                │
//!                     Report (date range, inclusive)
//!                                │
//!                  ┌─────────────┴─────────────┐
//!                  ▼                           ▼
//!           Document (PDF)          Spreadsheet (XLSX, CSV)
//! ```
//!
//! # Core Principle
//!
//! **The split is applied as configured.** A missing configuration falls back
//! to 50/50; a configuration that does not sum to 100% is logged but never
//! corrected.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Patient, Doctor, Appointment, Payment, etc.)
//! - [`billing`]: Share calculator and payment recording
//! - [`export`]: Payment reports with PDF, XLSX and CSV export
//! - [`images`]: Patient image storage
//! - [`config`]: TOML configuration

pub mod billing;
pub mod config;
pub mod db;
pub mod export;
pub mod images;
pub mod models;

// Re-export commonly used types
pub use billing::{calculate_shares, BillingError, ShareCalculator, SplitSource};
pub use config::ClinicConfig;
pub use db::Database;
pub use export::{PaymentReport, ReportDocument, ReportGenerator, ReportRow};
pub use images::ImageStore;
pub use models::{
    Appointment, AppointmentDetail, AppointmentStatus, Doctor, Gender, NewPayment, Patient,
    Payment, PaymentMethod, ShareSplit, Shares, Treatment, TreatmentPercentage,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ClinicError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<db::DbError> for ClinicError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => ClinicError::NotFound(what),
            other => ClinicError::DatabaseError(other.to_string()),
        }
    }
}

impl From<billing::BillingError> for ClinicError {
    fn from(e: billing::BillingError) -> Self {
        match e {
            billing::BillingError::AppointmentNotFound(id) => {
                ClinicError::NotFound(format!("appointment {}", id))
            }
            billing::BillingError::Database(db) => db.into(),
        }
    }
}

impl From<export::ExportError> for ClinicError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Database(db) => db.into(),
            export::ExportError::InvalidRange(msg) => ClinicError::InvalidInput(msg),
            other => ClinicError::ExportError(other.to_string()),
        }
    }
}

impl From<images::ImageError> for ClinicError {
    fn from(e: images::ImageError) -> Self {
        match e {
            images::ImageError::UnsupportedFormat(ext) => {
                ClinicError::InvalidInput(format!("unsupported image format: {}", ext))
            }
            images::ImageError::Io(io) => ClinicError::StorageError(io.to_string()),
        }
    }
}

impl From<config::ConfigError> for ClinicError {
    fn from(e: config::ConfigError) -> Self {
        ClinicError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for ClinicError {
    fn from(e: serde_json::Error) -> Self {
        ClinicError::ExportError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ClinicError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ClinicError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path, with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig {
        database_path: path.into(),
        ..ClinicConfig::default()
    };
    ClinicCore::from_config(&config).map(Arc::new)
}

/// Open the database described by a TOML configuration file.
#[uniffi::export]
pub fn open_with_config(config_path: String) -> Result<Arc<ClinicCore>, ClinicError> {
    let config = ClinicConfig::load(&config_path)?.apply_env_overrides();
    ClinicCore::from_config(&config).map(Arc::new)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ClinicCore>, ClinicError> {
    let db = Database::open_in_memory()?;
    let config = ClinicConfig::default();
    Ok(Arc::new(ClinicCore {
        db: Arc::new(Mutex::new(db)),
        images: ImageStore::new(config.images_dir.clone()),
        default_split: config.default_split(),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ClinicCore {
    db: Arc<Mutex<Database>>,
    images: ImageStore,
    default_split: ShareSplit,
}

impl ClinicCore {
    /// Open the store described by a configuration.
    pub fn from_config(config: &ClinicConfig) -> Result<Self, ClinicError> {
        let db = Database::open(&config.database_path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            images: ImageStore::new(config.images_dir.clone()),
            default_split: config.default_split(),
        })
    }

    fn report(&self, start_date: &str, end_date: &str) -> Result<PaymentReport, ClinicError> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        let db = self.db.lock()?;
        Ok(ReportGenerator::new(&db).generate(start, end)?)
    }
}

#[uniffi::export]
impl ClinicCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a patient, optionally storing an uploaded image.
    #[allow(clippy::too_many_arguments)]
    pub fn add_patient(
        &self,
        name: String,
        age: u32,
        gender: String,
        phone: Option<String>,
        address: Option<String>,
        medical_history: Option<String>,
        image: Option<FfiImageUpload>,
    ) -> Result<FfiPatient, ClinicError> {
        let gender: Gender = gender.parse().map_err(ClinicError::InvalidInput)?;
        let mut patient = Patient::new(name, age, gender);
        patient.phone = phone;
        patient.address = address;
        patient.medical_history = medical_history;

        let db = self.db.lock()?;

        let stored = match image {
            Some(upload) => {
                let path = self.images.save(&patient.name, &upload.extension, &upload.bytes)?;
                patient.image_path = Some(path.to_string_lossy().into_owned());
                Some(path)
            }
            None => None,
        };

        match db.insert_patient(&patient) {
            Ok(id) => patient.id = id,
            Err(e) => {
                if let Some(path) = stored {
                    if let Err(cleanup) = self.images.discard(&path) {
                        tracing::warn!(
                            path = %path.display(),
                            error = %cleanup,
                            "could not remove image of unsaved patient"
                        );
                    }
                }
                return Err(e.into());
            }
        }
        Ok(patient.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.get_patient(id)?.map(Into::into))
    }

    /// List all patients.
    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_patients()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Doctor Operations
    // =========================================================================

    /// Add a doctor.
    pub fn add_doctor(
        &self,
        name: String,
        specialty: Option<String>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<FfiDoctor, ClinicError> {
        let mut doctor = Doctor::new(name);
        doctor.specialty = specialty;
        doctor.phone = phone;
        doctor.email = email;

        let db = self.db.lock()?;
        doctor.id = db.insert_doctor(&doctor)?;
        Ok(doctor.into())
    }

    /// List all doctors.
    pub fn list_doctors(&self) -> Result<Vec<FfiDoctor>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_doctors()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Treatment Operations
    // =========================================================================

    /// Add a treatment to the catalog.
    pub fn add_treatment(&self, name: String, base_cost: f64) -> Result<FfiTreatment, ClinicError> {
        require_non_negative("base_cost", base_cost)?;
        let mut treatment = Treatment::new(name, base_cost);

        let db = self.db.lock()?;
        treatment.id = db.insert_treatment(&treatment)?;
        Ok(treatment.into())
    }

    /// List all treatments.
    pub fn list_treatments(&self) -> Result<Vec<FfiTreatment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_treatments()?.into_iter().map(Into::into).collect())
    }

    /// Configure the split for a (treatment, doctor) pair.
    ///
    /// Each percentage must lie in 0..=100; their sum is not checked.
    pub fn add_treatment_percentage(
        &self,
        treatment_id: i64,
        doctor_id: i64,
        clinic_percentage: f64,
        doctor_percentage: f64,
    ) -> Result<FfiTreatmentPercentage, ClinicError> {
        require_percentage("clinic_percentage", clinic_percentage)?;
        require_percentage("doctor_percentage", doctor_percentage)?;

        let db = self.db.lock()?;
        if db.get_treatment(treatment_id)?.is_none() {
            return Err(ClinicError::NotFound(format!("treatment {}", treatment_id)));
        }
        if db.get_doctor(doctor_id)?.is_none() {
            return Err(ClinicError::NotFound(format!("doctor {}", doctor_id)));
        }

        let mut config = TreatmentPercentage::new(
            treatment_id,
            doctor_id,
            ShareSplit::new(clinic_percentage, doctor_percentage),
        );
        config.id = db.insert_treatment_percentage(&config)?;
        Ok(config.into())
    }

    /// List all split configurations.
    pub fn list_treatment_percentages(&self) -> Result<Vec<FfiTreatmentPercentage>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .list_treatment_percentages()?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment. `scheduled_at` is `YYYY-MM-DD HH:MM[:SS]`.
    pub fn add_appointment(
        &self,
        patient_id: i64,
        doctor_id: i64,
        treatment_id: i64,
        scheduled_at: String,
        status: String,
        notes: Option<String>,
    ) -> Result<FfiAppointment, ClinicError> {
        let scheduled_at = parse_datetime(&scheduled_at)?;
        let mut appointment = Appointment::new(patient_id, doctor_id, treatment_id, scheduled_at);
        appointment.status = status.parse().map_err(ClinicError::InvalidInput)?;
        appointment.notes = notes;

        let db = self.db.lock()?;
        let patient = db
            .get_patient(patient_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("patient {}", patient_id)))?;
        let doctor = db
            .get_doctor(doctor_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("doctor {}", doctor_id)))?;
        let treatment = db
            .get_treatment(treatment_id)?
            .ok_or_else(|| ClinicError::NotFound(format!("treatment {}", treatment_id)))?;

        appointment.id = db.insert_appointment(&appointment)?;
        Ok(AppointmentDetail {
            appointment,
            patient_name: Some(patient.name),
            doctor_name: Some(doctor.name),
            treatment_name: Some(treatment.name),
        }
        .into())
    }

    /// List appointments with patient, doctor and treatment names.
    pub fn list_appointments(&self) -> Result<Vec<FfiAppointment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db
            .list_appointment_details()?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Preview the clinic/doctor split for a payment without recording it.
    pub fn calculate_shares(
        &self,
        appointment_id: i64,
        total_amount: f64,
        discounts: f64,
        taxes: f64,
    ) -> Result<FfiShares, ClinicError> {
        let db = self.db.lock()?;
        let shares = ShareCalculator::new(&db)
            .with_default_split(self.default_split)
            .calculate(appointment_id, total_amount, discounts, taxes)?;
        Ok(shares.into())
    }

    /// Record a payment with its computed clinic and doctor shares.
    pub fn add_payment(
        &self,
        appointment_id: i64,
        total_amount: f64,
        paid_amount: f64,
        payment_method: String,
        discounts: f64,
        taxes: f64,
    ) -> Result<FfiPayment, ClinicError> {
        require_non_negative("total_amount", total_amount)?;
        require_non_negative("paid_amount", paid_amount)?;
        require_non_negative("discounts", discounts)?;
        require_non_negative("taxes", taxes)?;

        let new = NewPayment {
            appointment_id,
            total_amount,
            paid_amount,
            payment_method: payment_method.parse().map_err(ClinicError::InvalidInput)?,
            discounts,
            taxes,
        };

        let db = self.db.lock()?;
        let payment = ShareCalculator::new(&db)
            .with_default_split(self.default_split)
            .record_payment(&new)?;
        Ok(payment.into())
    }

    /// List all payments.
    pub fn list_payments(&self) -> Result<Vec<FfiPayment>, ClinicError> {
        let db = self.db.lock()?;
        Ok(db.list_payments()?.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Report Operations
    // =========================================================================

    /// Payment report between two `YYYY-MM-DD` dates, both inclusive.
    pub fn generate_report(
        &self,
        start_date: String,
        end_date: String,
    ) -> Result<FfiReport, ClinicError> {
        Ok(self.report(&start_date, &end_date)?.into())
    }

    /// Export the report as PDF bytes.
    pub fn export_report_pdf(
        &self,
        start_date: String,
        end_date: String,
    ) -> Result<Vec<u8>, ClinicError> {
        Ok(self.report(&start_date, &end_date)?.to_pdf()?)
    }

    /// Export the report as an `.xlsx` workbook.
    pub fn export_report_xlsx(
        &self,
        start_date: String,
        end_date: String,
    ) -> Result<Vec<u8>, ClinicError> {
        Ok(self.report(&start_date, &end_date)?.to_xlsx()?)
    }

    /// Export the report as CSV.
    pub fn export_report_csv(
        &self,
        start_date: String,
        end_date: String,
    ) -> Result<String, ClinicError> {
        Ok(self.report(&start_date, &end_date)?.to_csv())
    }

    /// Export the report as JSON.
    pub fn export_report_json(
        &self,
        start_date: String,
        end_date: String,
    ) -> Result<String, ClinicError> {
        Ok(self.report(&start_date, &end_date)?.to_json()?)
    }
}

// =========================================================================
// Input Validation
// =========================================================================

fn require_non_negative(field: &str, value: f64) -> Result<(), ClinicError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ClinicError::InvalidInput(format!(
            "{} must be a non-negative number, got {}",
            field, value
        )));
    }
    Ok(())
}

fn require_percentage(field: &str, value: f64) -> Result<(), ClinicError> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(ClinicError::InvalidInput(format!(
            "{} must be between 0 and 100, got {}",
            field, value
        )));
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate, ClinicError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| ClinicError::InvalidInput(format!("expected YYYY-MM-DD, got '{}'", s)))
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, ClinicError> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .ok_or_else(|| {
            ClinicError::InvalidInput(format!("expected YYYY-MM-DD HH:MM[:SS], got '{}'", s))
        })
}

// =========================================================================
// FFI Types
// =========================================================================

/// Uploaded image file.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImageUpload {
    /// File extension, `png` or `jpg`
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: i64,
    pub name: String,
    pub age: u32,
    pub gender: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub image_path: Option<String>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            age: patient.age,
            gender: patient.gender.to_string(),
            phone: patient.phone,
            address: patient.address,
            medical_history: patient.medical_history,
            image_path: patient.image_path,
        }
    }
}

/// FFI-safe doctor.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: i64,
    pub name: String,
    pub specialty: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialty: doctor.specialty,
            phone: doctor.phone,
            email: doctor.email,
        }
    }
}

/// FFI-safe treatment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatment {
    pub id: i64,
    pub name: String,
    pub base_cost: f64,
}

impl From<Treatment> for FfiTreatment {
    fn from(treatment: Treatment) -> Self {
        Self {
            id: treatment.id,
            name: treatment.name,
            base_cost: treatment.base_cost,
        }
    }
}

/// FFI-safe split configuration.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentPercentage {
    pub id: i64,
    pub treatment_id: i64,
    pub doctor_id: i64,
    pub clinic_percentage: f64,
    pub doctor_percentage: f64,
    /// False when the two percentages do not sum to 100
    pub balanced: bool,
}

impl From<TreatmentPercentage> for FfiTreatmentPercentage {
    fn from(config: TreatmentPercentage) -> Self {
        Self {
            balanced: config.split().is_balanced(),
            id: config.id,
            treatment_id: config.treatment_id,
            doctor_id: config.doctor_id,
            clinic_percentage: config.clinic_percentage,
            doctor_percentage: config.doctor_percentage,
        }
    }
}

/// FFI-safe appointment with display names.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub treatment_id: i64,
    pub scheduled_at: String,
    pub status: String,
    pub notes: Option<String>,
    pub patient_name: Option<String>,
    pub doctor_name: Option<String>,
    pub treatment_name: Option<String>,
    pub label: String,
}

impl From<AppointmentDetail> for FfiAppointment {
    fn from(detail: AppointmentDetail) -> Self {
        let label = detail.label();
        let appt = detail.appointment;
        Self {
            id: appt.id,
            patient_id: appt.patient_id,
            doctor_id: appt.doctor_id,
            treatment_id: appt.treatment_id,
            scheduled_at: appt.scheduled_at.format(db::TIMESTAMP_FORMAT).to_string(),
            status: appt.status.to_string(),
            notes: appt.notes,
            patient_name: detail.patient_name,
            doctor_name: detail.doctor_name,
            treatment_name: detail.treatment_name,
            label,
        }
    }
}

/// FFI-safe share preview.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiShares {
    pub clinic_share: f64,
    pub doctor_share: f64,
}

impl From<Shares> for FfiShares {
    fn from(shares: Shares) -> Self {
        Self {
            clinic_share: shares.clinic_share,
            doctor_share: shares.doctor_share,
        }
    }
}

/// FFI-safe payment.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPayment {
    pub id: i64,
    pub appointment_id: i64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub clinic_share: f64,
    pub doctor_share: f64,
    pub payment_method: String,
    pub discounts: f64,
    pub taxes: f64,
    pub date_paid: String,
}

impl From<Payment> for FfiPayment {
    fn from(payment: Payment) -> Self {
        Self {
            id: payment.id,
            appointment_id: payment.appointment_id,
            total_amount: payment.total_amount,
            paid_amount: payment.paid_amount,
            clinic_share: payment.clinic_share,
            doctor_share: payment.doctor_share,
            payment_method: payment.payment_method.to_string(),
            discounts: payment.discounts,
            taxes: payment.taxes,
            date_paid: payment.date_paid.format(db::TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// FFI-safe report line.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReportRow {
    pub appointment_id: i64,
    pub total_amount: f64,
    pub clinic_share: f64,
    pub doctor_share: f64,
}

impl From<ReportRow> for FfiReportRow {
    fn from(row: ReportRow) -> Self {
        Self {
            appointment_id: row.appointment_id,
            total_amount: row.total_amount,
            clinic_share: row.clinic_share,
            doctor_share: row.doctor_share,
        }
    }
}

/// FFI-safe payment report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReport {
    pub start_date: String,
    pub end_date: String,
    pub rows: Vec<FfiReportRow>,
    pub total_amount: f64,
    pub total_clinic_share: f64,
    pub total_doctor_share: f64,
}

impl From<PaymentReport> for FfiReport {
    fn from(report: PaymentReport) -> Self {
        Self {
            total_amount: report.total_amount(),
            total_clinic_share: report.total_clinic_share(),
            total_doctor_share: report.total_doctor_share(),
            start_date: report.start_date.to_string(),
            end_date: report.end_date.to_string(),
            rows: report.rows.into_iter().map(Into::into).collect(),
        }
    }
}
