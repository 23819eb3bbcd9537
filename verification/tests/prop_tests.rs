use std::sync::Arc;

use chrono::NaiveDate;
use proptest::prelude::*;

use sv_nullables::{NullClock, NullCodeSource, NullDelivery, NullStore};
use sv_store::StudentStore;
use sv_types::{ProtectedField, RollNo, StudentDetails, StudentRecord, Timestamp};
use sv_verification::{diff, VerificationConfig, VerificationError, VerificationService};

fn roll() -> RollNo {
    RollNo::new("PROP-1").unwrap()
}

fn details() -> StudentDetails {
    StudentDetails {
        name: "Sana Farooq Shaikh".into(),
        email: "sana@example.com".into(),
        mobile_number: "9100000000".into(),
        father_mobile_number: "9100000001".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2005, 2, 1).unwrap(),
        address: "3 Lake View, Pune".into(),
        field_of_study: "Physics".into(),
        taluka: Some("Haveli".into()),
        city: None,
        district: Some("Pune".into()),
        pincode: None,
    }
}

/// Give `field` a value different from its current one.
fn touch(d: &mut StudentDetails, field: ProtectedField, salt: u32) {
    let fresh = format!("edited-{salt}");
    let flip = |v: &Option<String>| match v {
        Some(_) => None,
        None => Some(fresh.clone()),
    };
    match field {
        ProtectedField::Name => d.name = fresh.clone(),
        ProtectedField::Email => d.email = fresh.clone(),
        ProtectedField::MobileNumber => d.mobile_number = fresh.clone(),
        ProtectedField::FatherMobileNumber => d.father_mobile_number = fresh.clone(),
        ProtectedField::DateOfBirth => d.date_of_birth = d.date_of_birth.succ_opt().unwrap(),
        ProtectedField::Address => d.address = fresh.clone(),
        ProtectedField::FieldOfStudy => d.field_of_study = fresh.clone(),
        ProtectedField::Taluka => d.taluka = flip(&d.taluka),
        ProtectedField::City => d.city = flip(&d.city),
        ProtectedField::District => d.district = flip(&d.district),
        ProtectedField::Pincode => d.pincode = flip(&d.pincode),
    }
}

fn edited(mask: &[bool], salt: u32) -> StudentDetails {
    let mut d = details();
    for (field, _) in ProtectedField::ALL.iter().zip(mask).filter(|(_, on)| **on) {
        touch(&mut d, *field, salt);
    }
    d
}

type Rig = (VerificationService<NullStore>, Arc<NullClock>, Arc<NullDelivery>);

fn rig(record: StudentRecord, codes: NullCodeSource) -> Rig {
    let clock = Arc::new(NullClock::new(10_000));
    let delivery = Arc::new(NullDelivery::new());
    let service = VerificationService::new(
        Arc::new(NullStore::new().with_student(record)),
        VerificationConfig::default(),
    )
    .with_clock(clock.clone())
    .with_code_source(Arc::new(codes))
    .with_delivery(delivery.clone());
    (service, clock, delivery)
}

#[derive(Clone, Debug)]
enum Op {
    Edit(Vec<bool>),
    IssueAndConfirm,
    IssueAndMistype,
    VerifyData,
    Wait(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        proptest::collection::vec(any::<bool>(), 11).prop_map(Op::Edit),
        Just(Op::IssueAndConfirm),
        Just(Op::IssueAndMistype),
        Just(Op::VerifyData),
        (1u64..1_200).prop_map(Op::Wait),
    ]
}

proptest! {
    /// The diff reports exactly the fields that were touched, with the
    /// canonical old and new values.
    #[test]
    fn diff_reports_exactly_touched_fields(
        mask in proptest::collection::vec(any::<bool>(), 11),
        salt in 0u32..1000,
    ) {
        let old = details();
        let new = edited(&mask, salt);
        let old_snapshot = old.snapshot();
        let new_snapshot = new.snapshot();
        let changes = diff(&roll(), &old_snapshot, &new_snapshot, Timestamp::new(5)).unwrap();

        let expected: Vec<&str> = ProtectedField::ALL
            .iter()
            .zip(&mask)
            .filter(|(_, on)| **on)
            .map(|(f, _)| f.as_str())
            .collect();
        let got: Vec<&str> = changes.changed_fields().collect();
        prop_assert_eq!(got, expected);
        prop_assert_eq!(changes.mobile_changed, mask[2]);
        for entry in &changes.entries {
            prop_assert_ne!(&entry.old_value, &entry.new_value);
            prop_assert_eq!(old_snapshot.get(&entry.field_name), Some(entry.old_value.as_str()));
            prop_assert_eq!(new_snapshot.get(&entry.field_name), Some(entry.new_value.as_str()));
            prop_assert_eq!(entry.timestamp, Timestamp::new(5));
        }
    }

    /// Any edit clears data verification; only a mobile edit clears mobile
    /// verification; an empty edit clears nothing.
    #[test]
    fn edits_demote_by_field(
        mask in proptest::collection::vec(any::<bool>(), 11),
        mobile_verified in any::<bool>(),
        data_verified in any::<bool>(),
    ) {
        let mut record = StudentRecord::new(roll(), details(), Timestamp::new(0));
        record.is_mobile_verified = mobile_verified;
        record.is_data_verified = mobile_verified && data_verified;
        let before = record.clone();

        let (service, _, _) = rig(record, NullCodeSource::constant("123456"));
        let after = service.submit_edit(&roll(), edited(&mask, 1)).unwrap();

        if mask.iter().any(|on| *on) {
            prop_assert!(!after.is_data_verified);
            prop_assert_eq!(after.is_mobile_verified, before.is_mobile_verified && !mask[2]);
        } else {
            prop_assert_eq!(&after, &before);
        }
        prop_assert_eq!(service.store().get_student(&roll()).unwrap(), after);
    }

    /// Data is never verified while the mobile is not, whatever the sequence
    /// of operations.
    #[test]
    fn data_verified_implies_mobile_verified(ops in proptest::collection::vec(op(), 1..24)) {
        let record = StudentRecord::new(roll(), details(), Timestamp::new(0));
        let (service, clock, delivery) = rig(
            record,
            NullCodeSource::new(["111111", "222222", "333333"]),
        );
        let r = roll();

        for (i, op) in ops.into_iter().enumerate() {
            match op {
                Op::Edit(mask) => {
                    service.submit_edit(&r, edited(&mask, i as u32)).unwrap();
                }
                Op::IssueAndConfirm => {
                    let mobile = service.get_student(&r).unwrap().details.mobile_number;
                    service.issue_otp(&r, &mobile).unwrap();
                    let code = delivery.last_code().unwrap();
                    prop_assert!(service.validate_otp(&r, &code).unwrap().is_mobile_verified);
                }
                Op::IssueAndMistype => {
                    let mobile = service.get_student(&r).unwrap().details.mobile_number;
                    service.issue_otp(&r, &mobile).unwrap();
                    let err = service.validate_otp(&r, "000000").unwrap_err();
                    prop_assert!(matches!(err, VerificationError::CodeMismatch));
                }
                Op::VerifyData => {
                    let was_mobile = service.get_student(&r).unwrap().is_mobile_verified;
                    match service.request_data_verification(&r) {
                        Ok(rec) => prop_assert!(was_mobile && rec.is_data_verified),
                        Err(VerificationError::PreconditionFailed(_)) => prop_assert!(!was_mobile),
                        Err(other) => prop_assert!(false, "unexpected error: {other}"),
                    }
                }
                Op::Wait(secs) => clock.advance(secs),
            }
            let current = service.get_student(&r).unwrap();
            prop_assert!(!current.is_data_verified || current.is_mobile_verified);
        }
    }

    /// Any six-digit guess other than the issued code is rejected and does not
    /// consume the challenge.
    #[test]
    fn wrong_guess_never_consumes(guess in 0u32..1_000_000) {
        let guess = format!("{guess:06}");
        prop_assume!(guess != "482913");

        let record = StudentRecord::new(roll(), details(), Timestamp::new(0));
        let (service, _, _) = rig(record, NullCodeSource::constant("482913"));
        service.issue_otp(&roll(), "9100000000").unwrap();

        let err = service.validate_otp(&roll(), &guess).unwrap_err();
        prop_assert!(matches!(err, VerificationError::CodeMismatch));
        prop_assert!(service.validate_otp(&roll(), "482913").is_ok());
    }
}
