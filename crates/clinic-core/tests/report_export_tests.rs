//! Payment report and export integration tests.

use chrono::{NaiveDate, NaiveDateTime};

use clinic_core::billing::ShareCalculator;
use clinic_core::db::Database;
use clinic_core::export::{
    read_pdf, read_spreadsheet, read_workbook, ReportDocument, ReportGenerator, REPORT_COLUMNS,
};
use clinic_core::models::{
    Appointment, Doctor, Gender, NewPayment, Patient, ShareSplit, Treatment, TreatmentPercentage,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, s).unwrap()
}

/// Database with one appointment configured for a 70/30 split.
fn setup() -> (Database, i64) {
    let db = Database::open_in_memory().unwrap();
    let patient_id = db
        .insert_patient(&Patient::new("Omar".into(), 29, Gender::Male))
        .unwrap();
    let doctor_id = db.insert_doctor(&Doctor::new("Dr. Nour".into())).unwrap();
    let treatment_id = db
        .insert_treatment(&Treatment::new("Cleaning".into(), 300.0))
        .unwrap();
    db.insert_treatment_percentage(&TreatmentPercentage::new(
        treatment_id,
        doctor_id,
        ShareSplit::new(70.0, 30.0),
    ))
    .unwrap();
    let appt_id = db
        .insert_appointment(&Appointment::new(
            patient_id,
            doctor_id,
            treatment_id,
            at(2024, 6, 1, 9, 0, 0),
        ))
        .unwrap();
    (db, appt_id)
}

#[test]
fn test_report_range_includes_whole_end_date() {
    let (db, appt_id) = setup();
    let calculator = ShareCalculator::new(&db);

    let settled = [
        (100.0, at(2024, 6, 9, 23, 59, 59)), // before start
        (200.0, at(2024, 6, 10, 0, 0, 0)),   // start of range
        (300.0, at(2024, 6, 12, 14, 30, 0)),
        (400.0, at(2024, 6, 15, 23, 59, 59)), // last second of end date
        (500.0, at(2024, 6, 16, 0, 0, 0)),    // day after
    ];
    for (total, when) in settled {
        calculator
            .record_payment_at(&NewPayment::new(appt_id, total), when)
            .unwrap();
    }

    let report = ReportGenerator::new(&db)
        .generate(date(2024, 6, 10), date(2024, 6, 15))
        .unwrap();

    let totals: Vec<f64> = report.rows.iter().map(|r| r.total_amount).collect();
    assert_eq!(totals, vec![200.0, 300.0, 400.0]);
    assert_eq!(report.total_amount(), 900.0);
    assert!((report.total_clinic_share() - 630.0).abs() < 1e-9);
    assert!((report.total_doctor_share() - 270.0).abs() < 1e-9);
}

#[test]
fn test_single_day_and_inverted_ranges() {
    let (db, appt_id) = setup();
    ShareCalculator::new(&db)
        .record_payment_at(&NewPayment::new(appt_id, 100.0), at(2024, 6, 10, 12, 0, 0))
        .unwrap();

    let generator = ReportGenerator::new(&db);
    assert_eq!(
        generator
            .generate(date(2024, 6, 10), date(2024, 6, 10))
            .unwrap()
            .len(),
        1
    );
    assert!(generator
        .generate(date(2024, 6, 11), date(2024, 6, 10))
        .unwrap()
        .is_empty());
}

#[test]
fn test_exports_reproduce_report_rows() {
    let (db, appt_id) = setup();
    let calculator = ShareCalculator::new(&db);

    // Enough rows to span three document pages
    for i in 0..70u32 {
        let new = NewPayment::new(appt_id, 100.0 + f64::from(i) * 0.35)
            .with_discounts(f64::from(i % 7))
            .with_taxes(1.5);
        calculator
            .record_payment_at(&new, at(2024, 7, 1 + i % 28, 10, i % 60, 0))
            .unwrap();
    }

    let report = ReportGenerator::new(&db)
        .generate(date(2024, 7, 1), date(2024, 7, 31))
        .unwrap();
    assert_eq!(report.len(), 70);

    let csv = report.to_csv();
    assert_eq!(csv.lines().next().unwrap(), REPORT_COLUMNS.join(","));
    assert_eq!(read_spreadsheet(&csv).unwrap(), report.rows);

    let document = report.to_document();
    assert_eq!(document.page_count(), 3);
    assert_eq!(document.read_rows().unwrap(), report.rows);

    let xlsx = report.to_xlsx().unwrap();
    assert_eq!(read_workbook(&xlsx).unwrap(), report.rows);

    let pdf = report.to_pdf().unwrap();
    let rendered = ReportDocument::from_pdf(&pdf).unwrap();
    assert_eq!(rendered.page_count(), 3);
    assert_eq!(rendered, document);
    assert_eq!(read_pdf(&pdf).unwrap(), report.rows);
}

#[test]
fn test_empty_report_exports() {
    let (db, _) = setup();
    let report = ReportGenerator::new(&db)
        .generate(date(2024, 1, 1), date(2024, 1, 31))
        .unwrap();

    assert!(report.is_empty());
    assert!(read_spreadsheet(&report.to_csv()).unwrap().is_empty());
    assert!(read_workbook(&report.to_xlsx().unwrap()).unwrap().is_empty());
    assert!(read_pdf(&report.to_pdf().unwrap()).unwrap().is_empty());

    let document = report.to_document();
    assert_eq!(document.page_count(), 1);
    assert!(document.read_rows().unwrap().is_empty());
}
