//! Treatment catalog and split configuration operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::{Treatment, TreatmentPercentage};

impl Database {
    /// Insert a new treatment. Returns the assigned ID.
    pub fn insert_treatment(&self, treatment: &Treatment) -> DbResult<i64> {
        self.conn.execute(
            "INSERT INTO treatments (name, base_cost) VALUES (?1, ?2)",
            params![treatment.name, treatment.base_cost],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get a treatment by ID.
    pub fn get_treatment(&self, id: i64) -> DbResult<Option<Treatment>> {
        self.conn
            .query_row(
                "SELECT id, name, base_cost FROM treatments WHERE id = ?",
                [id],
                treatment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all treatments.
    pub fn list_treatments(&self) -> DbResult<Vec<Treatment>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, base_cost FROM treatments ORDER BY id")?;
        let rows = stmt.query_map([], treatment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a split configuration. Returns the assigned ID.
    ///
    /// Neither the percentage sum nor the pair's uniqueness is checked; a
    /// later row for the same pair takes precedence on lookup.
    pub fn insert_treatment_percentage(&self, config: &TreatmentPercentage) -> DbResult<i64> {
        let split = config.split();
        if !split.is_balanced() {
            tracing::warn!(
                treatment_id = config.treatment_id,
                doctor_id = config.doctor_id,
                total = split.total_percentage(),
                "split configuration does not sum to 100%"
            );
        }

        self.conn.execute(
            r#"
            INSERT INTO treatment_percentages (
                treatment_id, doctor_id, clinic_percentage, doctor_percentage
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                config.treatment_id,
                config.doctor_id,
                config.clinic_percentage,
                config.doctor_percentage,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Find the split configured for a (treatment, doctor) pair.
    ///
    /// When several rows exist for the pair, the most recently inserted one
    /// (highest ID) is returned.
    pub fn find_treatment_percentage(
        &self,
        treatment_id: i64,
        doctor_id: i64,
    ) -> DbResult<Option<TreatmentPercentage>> {
        self.conn
            .query_row(
                r#"
                SELECT id, treatment_id, doctor_id, clinic_percentage, doctor_percentage
                FROM treatment_percentages
                WHERE treatment_id = ?1 AND doctor_id = ?2
                ORDER BY id DESC
                LIMIT 1
                "#,
                params![treatment_id, doctor_id],
                percentage_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Number of split rows stored for a pair.
    pub fn count_treatment_percentages(&self, treatment_id: i64, doctor_id: i64) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM treatment_percentages WHERE treatment_id = ?1 AND doctor_id = ?2",
            params![treatment_id, doctor_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// List all split configurations.
    pub fn list_treatment_percentages(&self) -> DbResult<Vec<TreatmentPercentage>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, treatment_id, doctor_id, clinic_percentage, doctor_percentage
            FROM treatment_percentages
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], percentage_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn treatment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Treatment> {
    Ok(Treatment {
        id: row.get(0)?,
        name: row.get(1)?,
        base_cost: row.get(2)?,
    })
}

fn percentage_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TreatmentPercentage> {
    Ok(TreatmentPercentage {
        id: row.get(0)?,
        treatment_id: row.get(1)?,
        doctor_id: row.get(2)?,
        clinic_percentage: row.get(3)?,
        doctor_percentage: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Doctor, ShareSplit};

    fn setup_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let treatment_id = db
            .insert_treatment(&Treatment::new("Root canal".into(), 1500.0))
            .unwrap();
        let doctor_id = db.insert_doctor(&Doctor::new("Dr. Hana".into())).unwrap();
        (db, treatment_id, doctor_id)
    }

    #[test]
    fn test_insert_and_get_treatment() {
        let (db, treatment_id, _) = setup_db();

        let treatment = db.get_treatment(treatment_id).unwrap().unwrap();
        assert_eq!(treatment.name, "Root canal");
        assert_eq!(treatment.base_cost, 1500.0);
        assert_eq!(db.list_treatments().unwrap().len(), 1);
    }

    #[test]
    fn test_find_missing_percentage() {
        let (db, treatment_id, doctor_id) = setup_db();
        assert!(db
            .find_treatment_percentage(treatment_id, doctor_id)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_find_percentage_for_pair() {
        let (db, treatment_id, doctor_id) = setup_db();
        let other_doctor = db.insert_doctor(&Doctor::new("Dr. Karim".into())).unwrap();

        db.insert_treatment_percentage(&TreatmentPercentage::new(
            treatment_id,
            other_doctor,
            ShareSplit::new(20.0, 80.0),
        ))
        .unwrap();
        db.insert_treatment_percentage(&TreatmentPercentage::new(
            treatment_id,
            doctor_id,
            ShareSplit::new(70.0, 30.0),
        ))
        .unwrap();

        let found = db
            .find_treatment_percentage(treatment_id, doctor_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.split(), ShareSplit::new(70.0, 30.0));
    }

    #[test]
    fn test_latest_duplicate_wins() {
        let (db, treatment_id, doctor_id) = setup_db();

        db.insert_treatment_percentage(&TreatmentPercentage::new(
            treatment_id,
            doctor_id,
            ShareSplit::new(60.0, 40.0),
        ))
        .unwrap();
        let latest = db
            .insert_treatment_percentage(&TreatmentPercentage::new(
                treatment_id,
                doctor_id,
                ShareSplit::new(55.0, 45.0),
            ))
            .unwrap();

        assert_eq!(
            db.count_treatment_percentages(treatment_id, doctor_id).unwrap(),
            2
        );
        let found = db
            .find_treatment_percentage(treatment_id, doctor_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.id, latest);
        assert_eq!(found.clinic_percentage, 55.0);
    }

    #[test]
    fn test_unbalanced_percentage_is_stored() {
        let (db, treatment_id, doctor_id) = setup_db();

        db.insert_treatment_percentage(&TreatmentPercentage::new(
            treatment_id,
            doctor_id,
            ShareSplit::new(40.0, 40.0),
        ))
        .unwrap();

        let all = db.list_treatment_percentages().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].split().total_percentage(), 80.0);
    }
}
