//! Share calculation integration tests.

use chrono::NaiveDate;
use proptest::prelude::*;

use clinic_core::billing::{calculate_shares, net_amount, ShareCalculator, SplitSource};
use clinic_core::db::{Database, DbResult};
use clinic_core::models::{
    Appointment, Doctor, Gender, NewPayment, Patient, ShareSplit, Treatment, TreatmentPercentage,
};

/// Source with a single appointment and an optional configured split.
struct SingleAppointment {
    split: Option<ShareSplit>,
}

impl SplitSource for SingleAppointment {
    fn appointment(&self, appointment_id: i64) -> DbResult<Option<Appointment>> {
        let at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Ok((appointment_id == 1).then(|| {
            let mut appt = Appointment::new(1, 1, 1, at);
            appt.id = 1;
            appt
        }))
    }

    fn configured_split(&self, _treatment_id: i64, _doctor_id: i64) -> DbResult<Option<ShareSplit>> {
        Ok(self.split)
    }
}

fn seeded_db() -> (Database, i64, i64, i64) {
    let db = Database::open_in_memory().unwrap();
    let patient_id = db
        .insert_patient(&Patient::new("Layla".into(), 41, Gender::Female))
        .unwrap();
    let doctor_id = db
        .insert_doctor(&Doctor::new("Dr. Karim".into()).with_specialty("orthodontics"))
        .unwrap();
    let treatment_id = db
        .insert_treatment(&Treatment::new("Braces".into(), 2000.0))
        .unwrap();
    let at = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    let appt_id = db
        .insert_appointment(&Appointment::new(patient_id, doctor_id, treatment_id, at))
        .unwrap();
    (db, appt_id, doctor_id, treatment_id)
}

#[test]
fn test_configured_split_applies_to_net_amount() {
    let (db, appt_id, doctor_id, treatment_id) = seeded_db();
    db.insert_treatment_percentage(&TreatmentPercentage::new(
        treatment_id,
        doctor_id,
        ShareSplit::new(70.0, 30.0),
    ))
    .unwrap();

    let shares = calculate_shares(&db, appt_id, 1000.0, 100.0, 50.0).unwrap();

    // net = 1000 - 100 + 50 = 950
    assert!((shares.clinic_share - 665.0).abs() < 1e-9);
    assert!((shares.doctor_share - 285.0).abs() < 1e-9);
}

#[test]
fn test_reconfiguring_pair_affects_only_new_payments() {
    let (db, appt_id, doctor_id, treatment_id) = seeded_db();
    let calculator = ShareCalculator::new(&db);

    let first = calculator
        .record_payment(&NewPayment::new(appt_id, 1000.0))
        .unwrap();
    assert_eq!(first.clinic_share, 500.0);

    db.insert_treatment_percentage(&TreatmentPercentage::new(
        treatment_id,
        doctor_id,
        ShareSplit::new(80.0, 20.0),
    ))
    .unwrap();

    let second = calculator
        .record_payment(&NewPayment::new(appt_id, 1000.0))
        .unwrap();
    assert_eq!(second.clinic_share, 800.0);
    assert_eq!(second.doctor_share, 200.0);

    // Stored shares are a snapshot
    let stored = db.get_payment(first.id).unwrap().unwrap();
    assert_eq!(stored.clinic_share, 500.0);
    assert_eq!(db.list_payments_for_appointment(appt_id).unwrap().len(), 2);
}

#[test]
fn test_unbalanced_split_is_not_normalized() {
    let source = SingleAppointment {
        split: Some(ShareSplit::new(30.0, 30.0)),
    };
    let shares = calculate_shares(&source, 1, 1000.0, 0.0, 0.0).unwrap();
    assert_eq!(shares.clinic_share, 300.0);
    assert_eq!(shares.doctor_share, 300.0);
    assert!(shares.total() < 1000.0);
}

proptest! {
    #[test]
    fn prop_balanced_split_sums_to_net(
        clinic in 0.0f64..=100.0,
        total in 0.0f64..1_000_000.0,
        discounts in 0.0f64..10_000.0,
        taxes in 0.0f64..10_000.0,
    ) {
        let source = SingleAppointment {
            split: Some(ShareSplit::new(clinic, 100.0 - clinic)),
        };
        let shares = calculate_shares(&source, 1, total, discounts, taxes).unwrap();
        let net = net_amount(total, discounts, taxes);

        let tolerance = 1e-9 * net.abs().max(1.0);
        prop_assert!((shares.total() - net).abs() <= tolerance);
    }

    #[test]
    fn prop_default_split_is_even(total in 0.0f64..1_000_000.0) {
        let source = SingleAppointment { split: None };
        let shares = calculate_shares(&source, 1, total, 0.0, 0.0).unwrap();
        prop_assert_eq!(shares.clinic_share, shares.doctor_share);
        prop_assert_eq!(shares.clinic_share, total * 0.5);
    }

    #[test]
    fn prop_missing_appointment_is_an_error(id in 2i64..10_000) {
        let source = SingleAppointment { split: None };
        prop_assert!(calculate_shares(&source, id, 100.0, 0.0, 0.0).is_err());
    }
}
