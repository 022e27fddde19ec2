//! Share calculation and payment recording.

use chrono::NaiveDateTime;

use super::{BillingError, BillingResult};
use crate::db::{Database, DbError, DbResult};
use crate::models::{Appointment, NewPayment, Payment, ShareSplit, Shares};

/// Read access to the records the share calculation depends on.
///
/// [`Database`] is the production implementation; anything that can answer
/// these two lookups can drive [`calculate_shares`].
pub trait SplitSource {
    /// Look up an appointment by ID.
    fn appointment(&self, appointment_id: i64) -> DbResult<Option<Appointment>>;

    /// Split configured for a (treatment, doctor) pair, if any.
    fn configured_split(&self, treatment_id: i64, doctor_id: i64) -> DbResult<Option<ShareSplit>>;
}

impl SplitSource for Database {
    fn appointment(&self, appointment_id: i64) -> DbResult<Option<Appointment>> {
        self.get_appointment(appointment_id)
    }

    fn configured_split(&self, treatment_id: i64, doctor_id: i64) -> DbResult<Option<ShareSplit>> {
        let count = self.count_treatment_percentages(treatment_id, doctor_id)?;
        if count > 1 {
            tracing::warn!(
                treatment_id,
                doctor_id,
                count,
                "multiple split configurations for pair, using the most recent"
            );
        }
        Ok(self
            .find_treatment_percentage(treatment_id, doctor_id)?
            .map(|config| config.split()))
    }
}

/// Net amount the shares are computed from: total minus discounts plus taxes.
pub fn net_amount(total_amount: f64, discounts: f64, taxes: f64) -> f64 {
    total_amount - discounts + taxes
}

/// Split clinic and doctor shares for a payment against an appointment.
///
/// Falls back to an even 50/50 split when the appointment's (treatment,
/// doctor) pair has no configuration. Inputs are not range-checked, so
/// negative discounts or taxes flow straight into the shares.
pub fn calculate_shares<S: SplitSource + ?Sized>(
    source: &S,
    appointment_id: i64,
    total_amount: f64,
    discounts: f64,
    taxes: f64,
) -> BillingResult<Shares> {
    calculate_shares_with_default(
        source,
        ShareSplit::default(),
        appointment_id,
        total_amount,
        discounts,
        taxes,
    )
}

/// Same as [`calculate_shares`] with an explicit fallback split.
pub fn calculate_shares_with_default<S: SplitSource + ?Sized>(
    source: &S,
    default_split: ShareSplit,
    appointment_id: i64,
    total_amount: f64,
    discounts: f64,
    taxes: f64,
) -> BillingResult<Shares> {
    let appointment = source
        .appointment(appointment_id)?
        .ok_or(BillingError::AppointmentNotFound(appointment_id))?;

    let split = match source.configured_split(appointment.treatment_id, appointment.doctor_id)? {
        Some(split) => split,
        None => {
            tracing::debug!(
                appointment_id,
                treatment_id = appointment.treatment_id,
                doctor_id = appointment.doctor_id,
                "no split configured, using default"
            );
            default_split
        }
    };

    if !split.is_balanced() {
        tracing::warn!(
            appointment_id,
            clinic_percentage = split.clinic_percentage,
            doctor_percentage = split.doctor_percentage,
            "split does not sum to 100%, shares will not match the net amount"
        );
    }

    Ok(split.shares(net_amount(total_amount, discounts, taxes)))
}

/// Computes shares against the store and records payments.
pub struct ShareCalculator<'a> {
    db: &'a Database,
    default_split: ShareSplit,
}

impl<'a> ShareCalculator<'a> {
    /// Create a calculator with the standard 50/50 fallback.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            default_split: ShareSplit::default(),
        }
    }

    /// Override the split used for unconfigured pairs.
    pub fn with_default_split(mut self, split: ShareSplit) -> Self {
        self.default_split = split;
        self
    }

    /// Compute the shares for a prospective payment.
    pub fn calculate(
        &self,
        appointment_id: i64,
        total_amount: f64,
        discounts: f64,
        taxes: f64,
    ) -> BillingResult<Shares> {
        calculate_shares_with_default(
            self.db,
            self.default_split,
            appointment_id,
            total_amount,
            discounts,
            taxes,
        )
    }

    /// Compute shares and persist the payment, stamped with the current local time.
    pub fn record_payment(&self, new: &NewPayment) -> BillingResult<Payment> {
        self.record_payment_at(new, chrono::Local::now().naive_local())
    }

    /// Compute shares and persist the payment with an explicit settlement time.
    pub fn record_payment_at(
        &self,
        new: &NewPayment,
        date_paid: NaiveDateTime,
    ) -> BillingResult<Payment> {
        // Split lookup and insert see the same snapshot.
        let tx = self.db.transaction()?;

        let shares = self.calculate(
            new.appointment_id,
            new.total_amount,
            new.discounts,
            new.taxes,
        )?;

        let mut payment = Payment::from_new(new, shares, date_paid);
        payment.id = self.db.insert_payment(&payment)?;
        tx.commit().map_err(DbError::from)?;

        tracing::info!(
            payment_id = payment.id,
            appointment_id = payment.appointment_id,
            clinic_share = payment.clinic_share,
            doctor_share = payment.doctor_share,
            "payment recorded"
        );

        Ok(payment)
    }
}
