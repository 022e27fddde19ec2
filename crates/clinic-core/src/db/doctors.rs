//! Doctor database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Doctor;

impl Database {
    /// Insert a new doctor. Returns the assigned ID.
    pub fn insert_doctor(&self, doctor: &Doctor) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO doctors (name, specialty, phone, email) VALUES (?1, ?2, ?3, ?4)",
            params![doctor.name, doctor.specialty, doctor.phone, doctor.email],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a doctor by ID.
    pub fn get_doctor(&self, id: i64) -> DbResult<Option<Doctor>> {
        self.conn
            .query_row(
                "SELECT id, name, specialty, phone, email FROM doctors WHERE id = ?",
                [id],
                doctor_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all doctors.
    pub fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, specialty, phone, email FROM doctors ORDER BY id")?;

        let rows = stmt.query_map([], doctor_from_row)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Doctor> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        specialty: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
    })
}
