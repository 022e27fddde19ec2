//! Payment database operations.

use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::Payment;

const PAYMENT_COLUMNS: &str = r#"
    id, appointment_id, total_amount, paid_amount, clinic_share, doctor_share,
    payment_method, discounts, taxes, date_paid
"#;

impl Database {
    /// Insert a new payment. Returns the assigned ID.
    pub fn insert_payment(&self, payment: &Payment) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO payments (
                appointment_id, total_amount, paid_amount, clinic_share, doctor_share,
                payment_method, discounts, taxes, date_paid
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                payment.appointment_id,
                payment.total_amount,
                payment.paid_amount,
                payment.clinic_share,
                payment.doctor_share,
                payment.payment_method.as_str(),
                payment.discounts,
                payment.taxes,
                format_timestamp(&payment.date_paid),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a payment by ID.
    pub fn get_payment(&self, id: i64) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS);
        self.conn
            .query_row(&sql, [id], PaymentRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all payments in settlement order.
    pub fn list_payments(&self) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments ORDER BY date_paid, id",
            PAYMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], PaymentRow::from_row)?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }

    /// Payments settled in `[start, end)`, in settlement order.
    pub fn list_payments_between(
        &self,
        start: &NaiveDateTime,
        end: &NaiveDateTime,
    ) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE date_paid >= ?1 AND date_paid < ?2 ORDER BY date_paid, id",
            PAYMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![format_timestamp(start), format_timestamp(end)],
            PaymentRow::from_row,
        )?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }

    /// Payments recorded against one appointment.
    pub fn list_payments_for_appointment(&self, appointment_id: i64) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {} FROM payments WHERE appointment_id = ? ORDER BY date_paid, id",
            PAYMENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([appointment_id], PaymentRow::from_row)?;

        let mut payments = Vec::new();
        for row in rows {
            payments.push(row?.try_into()?);
        }
        Ok(payments)
    }
}

/// Intermediate row struct for database mapping.
struct PaymentRow {
    id: i64,
    appointment_id: i64,
    total_amount: f64,
    paid_amount: f64,
    clinic_share: f64,
    doctor_share: f64,
    payment_method: String,
    discounts: f64,
    taxes: f64,
    date_paid: String,
}

impl PaymentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            appointment_id: row.get(1)?,
            total_amount: row.get(2)?,
            paid_amount: row.get(3)?,
            clinic_share: row.get(4)?,
            doctor_share: row.get(5)?,
            payment_method: row.get(6)?,
            discounts: row.get(7)?,
            taxes: row.get(8)?,
            date_paid: row.get(9)?,
        })
    }
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        Ok(Payment {
            id: row.id,
            appointment_id: row.appointment_id,
            total_amount: row.total_amount,
            paid_amount: row.paid_amount,
            clinic_share: row.clinic_share,
            doctor_share: row.doctor_share,
            payment_method: row.payment_method.parse().map_err(DbError::Constraint)?,
            discounts: row.discounts,
            taxes: row.taxes,
            date_paid: parse_timestamp(&row.date_paid)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Appointment, Doctor, Gender, NewPayment, Patient, PaymentMethod, Shares, Treatment,
    };
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn setup_db() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let patient_id = db
            .insert_patient(&Patient::new("Sara".into(), 34, Gender::Female))
            .unwrap();
        let doctor_id = db.insert_doctor(&Doctor::new("Dr. Hana".into())).unwrap();
        let treatment_id = db
            .insert_treatment(&Treatment::new("Cleaning".into(), 200.0))
            .unwrap();
        let appointment_id = db
            .insert_appointment(&Appointment::new(patient_id, doctor_id, treatment_id, at(1, 9)))
            .unwrap();
        (db, appointment_id)
    }

    fn make_payment(appointment_id: i64, total: f64, paid_at: NaiveDateTime) -> Payment {
        let mut new = NewPayment::new(appointment_id, total);
        new.payment_method = PaymentMethod::Card;
        Payment::from_new(
            &new,
            Shares {
                clinic_share: total / 2.0,
                doctor_share: total / 2.0,
            },
            paid_at,
        )
    }

    #[test]
    fn test_insert_and_get() {
        let (db, appointment_id) = setup_db();

        let id = db
            .insert_payment(&make_payment(appointment_id, 400.0, at(2, 11)))
            .unwrap();

        let payment = db.get_payment(id).unwrap().unwrap();
        assert_eq!(payment.appointment_id, appointment_id);
        assert_eq!(payment.clinic_share, 200.0);
        assert_eq!(payment.payment_method, PaymentMethod::Card);
        assert_eq!(payment.date_paid, at(2, 11));
    }

    #[test]
    fn test_payments_between_is_half_open() {
        let (db, appointment_id) = setup_db();

        db.insert_payment(&make_payment(appointment_id, 100.0, at(1, 0)))
            .unwrap();
        db.insert_payment(&make_payment(appointment_id, 200.0, at(2, 23)))
            .unwrap();
        db.insert_payment(&make_payment(appointment_id, 300.0, at(3, 0)))
            .unwrap();

        let payments = db.list_payments_between(&at(1, 0), &at(3, 0)).unwrap();
        let totals: Vec<f64> = payments.iter().map(|p| p.total_amount).collect();
        assert_eq!(totals, vec![100.0, 200.0]);
    }

    #[test]
    fn test_payments_for_appointment() {
        let (db, appointment_id) = setup_db();
        db.insert_payment(&make_payment(appointment_id, 100.0, at(2, 9)))
            .unwrap();
        db.insert_payment(&make_payment(appointment_id, 50.0, at(2, 10)))
            .unwrap();

        assert_eq!(db.list_payments_for_appointment(appointment_id).unwrap().len(), 2);
        assert_eq!(db.list_payments().unwrap().len(), 2);
    }

    #[test]
    fn test_payment_requires_existing_appointment() {
        let (db, _) = setup_db();
        let result = db.insert_payment(&make_payment(999, 100.0, at(2, 9)));
        assert!(matches!(result, Err(DbError::Sqlite(_))));
    }
}
