//! Patient database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::Patient;

impl Database {
    /// Insert a new patient. Returns the assigned ID.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                name, age, gender, phone, address, medical_history, image_path
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                patient.name,
                patient.age,
                patient.gender.as_str(),
                patient.phone,
                patient.address,
                patient.medical_history,
                patient.image_path,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, age, gender, phone, address, medical_history, image_path
                FROM patients
                WHERE id = ?
                "#,
                [id],
                PatientRow::from_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all patients in registration order.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, age, gender, phone, address, medical_history, image_path
            FROM patients
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], PatientRow::from_row)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }

    /// Attach an uploaded image to a patient.
    pub fn set_patient_image(&self, id: i64, image_path: &str) -> DbResult<()> {
        let rows_affected = self.conn.execute(
            "UPDATE patients SET image_path = ? WHERE id = ?",
            params![image_path, id],
        )?;
        if rows_affected == 0 {
            return Err(DbError::NotFound(format!("patient {}", id)));
        }
        Ok(())
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: i64,
    name: String,
    age: u32,
    gender: String,
    phone: Option<String>,
    address: Option<String>,
    medical_history: Option<String>,
    image_path: Option<String>,
}

impl PatientRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            gender: row.get(3)?,
            phone: row.get(4)?,
            address: row.get(5)?,
            medical_history: row.get(6)?,
            image_path: row.get(7)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender.parse().map_err(DbError::Constraint)?,
            phone: row.phone,
            address: row.address,
            medical_history: row.medical_history,
            image_path: row.image_path,
        })
    }
}
