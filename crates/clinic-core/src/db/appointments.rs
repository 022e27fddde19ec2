//! Appointment database operations.

use rusqlite::{params, OptionalExtension};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{Appointment, AppointmentDetail};

impl Database {
    /// Insert a new appointment. Returns the assigned ID.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                patient_id, doctor_id, treatment_id, scheduled_at, status, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                appointment.patient_id,
                appointment.doctor_id,
                appointment.treatment_id,
                format_timestamp(&appointment.scheduled_at),
                appointment.status.as_str(),
                appointment.notes,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: i64) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, patient_id, doctor_id, treatment_id, scheduled_at, status, notes
                FROM appointments
                WHERE id = ?
                "#,
                [id],
                AppointmentRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all appointments ordered by schedule.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, patient_id, doctor_id, treatment_id, scheduled_at, status, notes
            FROM appointments
            ORDER BY scheduled_at, id
            "#,
        )?;

        let rows = stmt.query_map([], AppointmentRow::from_row)?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(row?.try_into()?);
        }
        Ok(appointments)
    }

    /// List appointments joined with patient, doctor and treatment names.
    pub fn list_appointment_details(&self) -> DbResult<Vec<AppointmentDetail>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT a.id, a.patient_id, a.doctor_id, a.treatment_id,
                   a.scheduled_at, a.status, a.notes,
                   p.name, d.name, t.name
            FROM appointments a
            LEFT JOIN patients p ON p.id = a.patient_id
            LEFT JOIN doctors d ON d.id = a.doctor_id
            LEFT JOIN treatments t ON t.id = a.treatment_id
            ORDER BY a.scheduled_at, a.id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                AppointmentRow::from_row(row)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, Option<String>>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;

        let mut details = Vec::new();
        for row in rows {
            let (appointment, patient_name, doctor_name, treatment_name) = row?;
            details.push(AppointmentDetail {
                appointment: appointment.try_into()?,
                patient_name,
                doctor_name,
                treatment_name,
            });
        }
        Ok(details)
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    treatment_id: i64,
    scheduled_at: String,
    status: String,
    notes: Option<String>,
}

impl AppointmentRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            treatment_id: row.get(3)?,
            scheduled_at: row.get(4)?,
            status: row.get(5)?,
            notes: row.get(6)?,
        })
    }
}

impl TryFrom<AppointmentRow> for Appointment {
    type Error = DbError;

    fn try_from(row: AppointmentRow) -> Result<Self, Self::Error> {
        Ok(Appointment {
            id: row.id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            treatment_id: row.treatment_id,
            scheduled_at: parse_timestamp(&row.scheduled_at)?,
            status: row.status.parse().map_err(DbError::Constraint)?,
            notes: row.notes,
        })
    }
}
