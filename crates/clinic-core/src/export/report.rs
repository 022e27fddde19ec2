//! Payment report over a date range.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{ExportError, ExportResult};
use crate::db::Database;
use crate::models::Payment;

/// Column names shared by every export format, in order.
pub const REPORT_COLUMNS: [&str; 4] = ["Appointment", "Total", "Clinic Share", "Doctor Share"];

/// One payment line in a report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRow {
    pub appointment_id: i64,
    pub total_amount: f64,
    pub clinic_share: f64,
    pub doctor_share: f64,
}

impl ReportRow {
    pub fn from_payment(payment: &Payment) -> Self {
        Self {
            appointment_id: payment.appointment_id,
            total_amount: payment.total_amount,
            clinic_share: payment.clinic_share,
            doctor_share: payment.doctor_share,
        }
    }

    /// Cell text in [`REPORT_COLUMNS`] order.
    ///
    /// Amounts use the shortest representation that parses back to the same
    /// value, so exported files re-read losslessly.
    pub fn cells(&self) -> [String; 4] {
        [
            self.appointment_id.to_string(),
            self.total_amount.to_string(),
            self.clinic_share.to_string(),
            self.doctor_share.to_string(),
        ]
    }

    /// Parse a row back from cell text.
    pub fn from_cells<S: AsRef<str>>(cells: &[S]) -> ExportResult<Self> {
        if cells.len() != REPORT_COLUMNS.len() {
            return Err(ExportError::Malformed(format!(
                "expected {} cells, found {}",
                REPORT_COLUMNS.len(),
                cells.len()
            )));
        }

        let amount = |idx: usize| -> ExportResult<f64> {
            let text = cells[idx].as_ref().trim();
            text.parse().map_err(|_| {
                ExportError::Malformed(format!("{}: not a number: '{}'", REPORT_COLUMNS[idx], text))
            })
        };

        let id_text = cells[0].as_ref().trim();
        let appointment_id = id_text.parse().map_err(|_| {
            ExportError::Malformed(format!("{}: not an ID: '{}'", REPORT_COLUMNS[0], id_text))
        })?;

        Ok(Self {
            appointment_id,
            total_amount: amount(1)?,
            clinic_share: amount(2)?,
            doctor_share: amount(3)?,
        })
    }
}

/// Payments settled between two dates, both inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rows: Vec<ReportRow>,
}

impl PaymentReport {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate, rows: Vec<ReportRow>) -> Self {
        Self {
            start_date,
            end_date,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of billed totals.
    pub fn total_amount(&self) -> f64 {
        self.rows.iter().map(|r| r.total_amount).sum()
    }

    /// Sum of clinic shares.
    pub fn total_clinic_share(&self) -> f64 {
        self.rows.iter().map(|r| r.clinic_share).sum()
    }

    /// Sum of doctor shares.
    pub fn total_doctor_share(&self) -> f64 {
        self.rows.iter().map(|r| r.doctor_share).sum()
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Builds payment reports from the store.
pub struct ReportGenerator<'a> {
    db: &'a Database,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Report of payments dated from `start_date` through `end_date`.
    ///
    /// A payment settled at any time on `end_date` is included. An inverted
    /// range yields an empty report.
    pub fn generate(&self, start_date: NaiveDate, end_date: NaiveDate) -> ExportResult<PaymentReport> {
        let day_after_end = end_date
            .succ_opt()
            .ok_or_else(|| ExportError::InvalidRange(format!("no day after {}", end_date)))?;

        let start = start_date.and_time(NaiveTime::MIN);
        let end = day_after_end.and_time(NaiveTime::MIN);

        let payments = self.db.list_payments_between(&start, &end)?;
        let rows: Vec<ReportRow> = payments.iter().map(ReportRow::from_payment).collect();

        tracing::debug!(
            %start_date,
            %end_date,
            rows = rows.len(),
            "payment report generated"
        );

        Ok(PaymentReport::new(start_date, end_date, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, total: f64, clinic: f64, doctor: f64) -> ReportRow {
        ReportRow {
            appointment_id: id,
            total_amount: total,
            clinic_share: clinic,
            doctor_share: doctor,
        }
    }

    #[test]
    fn test_cells_roundtrip_preserves_precision() {
        let original = row(7, 1000.0, 665.0000000000001, 284.99999999999994);
        let cells = original.cells();
        assert_eq!(cells[0], "7");
        assert_eq!(cells[1], "1000");

        let parsed = ReportRow::from_cells(&cells).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_from_cells_rejects_bad_input() {
        assert!(matches!(
            ReportRow::from_cells(&["1", "2", "3"]),
            Err(ExportError::Malformed(_))
        ));
        assert!(matches!(
            ReportRow::from_cells(&["x", "2", "3", "4"]),
            Err(ExportError::Malformed(_))
        ));
        assert!(matches!(
            ReportRow::from_cells(&["1", "2", "three", "4"]),
            Err(ExportError::Malformed(_))
        ));
    }

    #[test]
    fn test_report_totals() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let report = PaymentReport::new(
            date,
            date,
            vec![row(1, 1000.0, 500.0, 500.0), row(2, 300.0, 210.0, 90.0)],
        );

        assert_eq!(report.len(), 2);
        assert_eq!(report.total_amount(), 1300.0);
        assert_eq!(report.total_clinic_share(), 710.0);
        assert_eq!(report.total_doctor_share(), 590.0);

        let json = report.to_json().unwrap();
        assert!(json.contains("\"appointment_id\": 2"));
    }
}
