//! SQLite schema definition.

/// Complete database schema for the clinic store.
///
/// Every statement is idempotent so the schema can be applied on each open.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
    gender TEXT NOT NULL,                        -- male, female
    phone TEXT,
    address TEXT,
    medical_history TEXT,
    image_path TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);

-- ============================================================================
-- Doctors
-- ============================================================================

CREATE TABLE IF NOT EXISTS doctors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    specialty TEXT,
    phone TEXT,
    email TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Treatments
-- ============================================================================

CREATE TABLE IF NOT EXISTS treatments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    base_cost REAL NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Split configuration per (treatment, doctor). Pairs are not unique and the
-- two percentages are not required to sum to 100.
CREATE TABLE IF NOT EXISTS treatment_percentages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    treatment_id INTEGER NOT NULL REFERENCES treatments(id),
    doctor_id INTEGER NOT NULL REFERENCES doctors(id),
    clinic_percentage REAL NOT NULL,
    doctor_percentage REAL NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_percentages_pair
    ON treatment_percentages(treatment_id, doctor_id);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id),
    doctor_id INTEGER NOT NULL REFERENCES doctors(id),
    treatment_id INTEGER NOT NULL REFERENCES treatments(id),
    scheduled_at TEXT NOT NULL,                  -- YYYY-MM-DD HH:MM:SS, local time
    status TEXT NOT NULL DEFAULT 'pending',      -- confirmed, cancelled, pending
    notes TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_scheduled ON appointments(scheduled_at);

-- ============================================================================
-- Payments
-- ============================================================================

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    appointment_id INTEGER NOT NULL REFERENCES appointments(id),
    total_amount REAL NOT NULL,
    paid_amount REAL NOT NULL,
    clinic_share REAL NOT NULL,
    doctor_share REAL NOT NULL,
    payment_method TEXT NOT NULL,                -- cash, card, transfer
    discounts REAL NOT NULL DEFAULT 0,
    taxes REAL NOT NULL DEFAULT 0,
    date_paid TEXT NOT NULL                      -- YYYY-MM-DD HH:MM:SS, local time
);

CREATE INDEX IF NOT EXISTS idx_payments_date_paid ON payments(date_paid);
CREATE INDEX IF NOT EXISTS idx_payments_appointment ON payments(appointment_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_duplicate_percentage_pairs_allowed() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO treatments (name, base_cost) VALUES ('Filling', 300)", [])
            .unwrap();
        conn.execute("INSERT INTO doctors (name) VALUES ('Dr. Hana')", [])
            .unwrap();

        for _ in 0..2 {
            let result = conn.execute(
                "INSERT INTO treatment_percentages (treatment_id, doctor_id, clinic_percentage, doctor_percentage)
                 VALUES (1, 1, 40, 40)",
                [],
            );
            assert!(result.is_ok());
        }
    }

    #[test]
    fn test_appointment_requires_existing_patient() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO appointments (patient_id, doctor_id, treatment_id, scheduled_at)
             VALUES (99, 99, 99, '2024-01-01 10:00:00')",
            [],
        );
        assert!(result.is_err());
    }
}
