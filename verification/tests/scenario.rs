//! End-to-end tests of the verification service against the nullable store:
//! edits and demotion, the OTP round trip, data verification and the failure
//! paths between them.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use sv_nullables::{Fault, NullClock, NullCodeSource, NullDelivery, NullStore};
use sv_store::{OtpStore, StudentStore};
use sv_types::{DetailsPatch, RollNo, StudentDetails, StudentRecord, Timestamp, VerificationStatus};
use sv_verification::{
    ServiceEvents, Transition, VerificationConfig, VerificationError, VerificationService,
    OTP_TTL_SECS,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    service: VerificationService<NullStore>,
    clock: Arc<NullClock>,
    delivery: Arc<NullDelivery>,
}

impl Harness {
    fn store(&self) -> &NullStore {
        self.service.store()
    }
}

fn roll(s: &str) -> RollNo {
    RollNo::new(s).unwrap()
}

fn details(mobile: &str) -> StudentDetails {
    StudentDetails {
        name: "Kiran Mohan Desai".into(),
        email: "kiran@example.com".into(),
        mobile_number: mobile.into(),
        father_mobile_number: "9800000000".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2004, 11, 23).unwrap(),
        address: "21 Temple Street, Satara".into(),
        field_of_study: "Mathematics".into(),
        taluka: Some("Satara".into()),
        city: Some("Satara".into()),
        district: Some("Satara".into()),
        pincode: Some("415001".into()),
    }
}

fn record(r: &str, mobile_verified: bool, data_verified: bool) -> StudentRecord {
    let mut rec = StudentRecord::new(roll(r), details("9000000000"), Timestamp::new(0));
    rec.is_mobile_verified = mobile_verified;
    rec.is_data_verified = data_verified;
    rec
}

fn harness_with(records: Vec<StudentRecord>, codes: NullCodeSource) -> Harness {
    let store = records
        .into_iter()
        .fold(NullStore::new(), |store, rec| store.with_student(rec));
    let clock = Arc::new(NullClock::new(1_000));
    let delivery = Arc::new(NullDelivery::new());
    let service = VerificationService::new(Arc::new(store), VerificationConfig::default())
        .with_clock(clock.clone())
        .with_code_source(Arc::new(codes))
        .with_delivery(delivery.clone());
    Harness {
        service,
        clock,
        delivery,
    }
}

fn harness(records: Vec<StudentRecord>) -> Harness {
    harness_with(records, NullCodeSource::new(["482913", "075316", "311208"]))
}

// ---------------------------------------------------------------------------
// Full scenario
// ---------------------------------------------------------------------------

#[test]
fn unverified_record_reaches_fully_verified() {
    let h = harness(vec![record("101", false, false)]);
    let r = roll("101");

    let edited = h.service.submit_edit(&r, details("9111111111")).unwrap();
    assert_eq!(edited.status(), VerificationStatus::Unverified);
    let history = h.service.get_change_history(&r).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].field_name, "mobile_number");
    assert_eq!(history[0].old_value, "9000000000");
    assert_eq!(history[0].new_value, "9111111111");

    let receipt = h.service.issue_otp(&r, "9111111111").unwrap();
    assert_eq!(receipt.target_mobile_number, "9111111111");
    assert_eq!(receipt.expires_at, Timestamp::new(1_000 + OTP_TTL_SECS));

    let err = h.service.validate_otp(&r, "000000").unwrap_err();
    assert!(matches!(err, VerificationError::CodeMismatch));
    let challenges = h.store().get_otp_challenges(&r).unwrap();
    assert_eq!(challenges.len(), 1);
    assert!(!challenges[0].is_used);

    let code = h.delivery.last_code().unwrap();
    let rec = h.service.validate_otp(&r, &code).unwrap();
    assert!(rec.is_mobile_verified);
    assert_eq!(rec.status(), VerificationStatus::MobileVerified);

    let rec = h.service.request_data_verification(&r).unwrap();
    assert!(rec.is_data_verified);
    assert_eq!(
        h.store().get_student(&r).unwrap().status(),
        VerificationStatus::FullyVerified
    );
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

#[test]
fn identical_edit_is_a_no_op() {
    let h = harness(vec![record("7", true, true)]);
    let rec = h.service.submit_edit(&roll("7"), details("9000000000")).unwrap();
    assert!(rec.is_mobile_verified && rec.is_data_verified);
    assert_eq!(h.store().change_count(), 0);
    assert_eq!(rec.updated_at, Timestamp::new(0));
}

#[test]
fn address_edit_demotes_data_only() {
    let h = harness(vec![record("7", true, true)]);
    let mut new = details("9000000000");
    new.address = "5 Fort Road, Satara".into();
    let rec = h.service.submit_edit(&roll("7"), new).unwrap();
    assert!(rec.is_mobile_verified);
    assert!(!rec.is_data_verified);
    assert_eq!(rec.updated_at, Timestamp::new(1_000));
    assert_eq!(h.store().get_student(&roll("7")).unwrap(), rec);
}

#[test]
fn mobile_edit_demotes_both() {
    let h = harness(vec![record("7", true, true)]);
    let rec = h.service.submit_edit(&roll("7"), details("9222222222")).unwrap();
    assert_eq!(rec.status(), VerificationStatus::Unverified);
}

#[test]
fn patch_touches_only_given_fields() {
    let h = harness(vec![record("8", true, true)]);
    let patch = DetailsPatch {
        date_of_birth: NaiveDate::from_ymd_opt(2004, 11, 24),
        pincode: Some(String::new()),
        ..Default::default()
    };
    let rec = h.service.submit_patch(&roll("8"), &patch).unwrap();
    assert!(rec.is_mobile_verified);
    assert!(!rec.is_data_verified);

    let history = h.service.get_change_history(&roll("8")).unwrap();
    let fields: Vec<&str> = history.iter().map(|e| e.field_name.as_str()).collect();
    // Same commit, so the later field in the snapshot is listed first.
    assert_eq!(fields, vec!["pincode", "date_of_birth"]);
    assert_eq!(history[0].old_value, "415001");
    assert_eq!(history[0].new_value, "");
    assert_eq!(history[1].new_value, "2004-11-24");
}

#[test]
fn history_lists_later_edits_first() {
    let h = harness(vec![record("9", false, false)]);
    let mut first = details("9000000000");
    first.address = "First Lane".into();
    h.service.submit_edit(&roll("9"), first.clone()).unwrap();

    h.clock.advance(60);
    let mut second = first;
    second.field_of_study = "Statistics".into();
    h.service.submit_edit(&roll("9"), second).unwrap();

    let history = h.service.get_change_history(&roll("9")).unwrap();
    assert_eq!(history[0].field_name, "field_of_study");
    assert_eq!(history[0].timestamp, Timestamp::new(1_060));
    assert_eq!(history[1].field_name, "address");
}

#[test]
fn failed_edit_commit_changes_nothing() {
    let h = harness(vec![record("11", true, true)]);
    h.store().fail_next(Fault::AppendChanges);
    let err = h
        .service
        .submit_edit(&roll("11"), details("9333333333"))
        .unwrap_err();
    assert!(matches!(err, VerificationError::Persistence(_)));
    assert!(err.is_retryable());

    let stored = h.store().get_student(&roll("11")).unwrap();
    assert_eq!(stored.status(), VerificationStatus::FullyVerified);
    assert_eq!(stored.details.mobile_number, "9000000000");
    assert_eq!(h.store().change_count(), 0);
}

#[test]
fn concurrent_edits_to_one_record_serialize() {
    let h = harness(vec![record("12", true, true)]);
    let r = roll("12");
    std::thread::scope(|s| {
        for i in 0..8 {
            let service = &h.service;
            let r = r.clone();
            s.spawn(move || {
                let mut d = details("9000000000");
                d.address = format!("{i} Parallel Street");
                service.submit_edit(&r, d).unwrap();
            });
        }
    });
    // Every edit saw the previous one's address, so each logged exactly one entry.
    let history = h.service.get_change_history(&r).unwrap();
    assert_eq!(history.len(), 8);
    let stored = h.store().get_student(&r).unwrap();
    assert_eq!(stored.details.address, history[0].new_value);
    assert!(stored.is_mobile_verified && !stored.is_data_verified);
}

// ---------------------------------------------------------------------------
// Data verification
// ---------------------------------------------------------------------------

#[test]
fn data_verification_requires_verified_mobile() {
    let h = harness(vec![record("20", false, false), record("21", false, true)]);
    for r in ["20", "21"] {
        let err = h.service.request_data_verification(&roll(r)).unwrap_err();
        assert!(matches!(err, VerificationError::PreconditionFailed(_)));
        assert_eq!(err.to_string(), "mobile number must be verified first");
    }
    assert!(!h.store().get_student(&roll("20")).unwrap().is_data_verified);
}

#[test]
fn unknown_roll_is_not_found_everywhere() {
    let h = harness(vec![]);
    let r = roll("404");
    assert!(matches!(h.service.get_student(&r), Err(VerificationError::NotFound(_))));
    assert!(matches!(
        h.service.submit_edit(&r, details("9000000000")),
        Err(VerificationError::NotFound(_))
    ));
    assert!(matches!(
        h.service.request_data_verification(&r),
        Err(VerificationError::NotFound(_))
    ));
    assert!(matches!(
        h.service.issue_otp(&r, "9000000000"),
        Err(VerificationError::NotFound(_))
    ));
    assert!(matches!(
        h.service.validate_otp(&r, "123456"),
        Err(VerificationError::NotFound(_))
    ));
    assert!(matches!(
        h.service.get_change_history(&r),
        Err(VerificationError::NotFound(_))
    ));
}

// ---------------------------------------------------------------------------
// OTP
// ---------------------------------------------------------------------------

#[test]
fn otp_is_single_use() {
    let h = harness(vec![record("30", false, false)]);
    let r = roll("30");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();
    h.service.validate_otp(&r, &code).unwrap();

    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::NoValidChallenge(_)));
}

#[test]
fn expired_otp_is_never_selected() {
    let h = harness(vec![record("31", false, false)]);
    let r = roll("31");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();

    h.clock.advance(OTP_TTL_SECS);
    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::NoValidChallenge(_)));
    assert!(!h.store().get_student(&r).unwrap().is_mobile_verified);
}

#[test]
fn newest_challenge_is_the_one_checked() {
    let h = harness_with(
        vec![record("32", false, false)],
        NullCodeSource::new(["111111", "222222"]),
    );
    let r = roll("32");
    h.service.issue_otp(&r, "9000000000").unwrap();
    h.service.issue_otp(&r, "9000000000").unwrap();

    let err = h.service.validate_otp(&r, "111111").unwrap_err();
    assert!(matches!(err, VerificationError::CodeMismatch));
    assert!(h.service.validate_otp(&r, "222222").unwrap().is_mobile_verified);
}

#[test]
fn same_second_challenges_break_ties_by_id() {
    let h = harness_with(
        vec![record("33", false, false)],
        NullCodeSource::new(["101010", "202020"]),
    );
    let r = roll("33");
    let first = h.service.issue_otp(&r, "9000000000").unwrap();
    let second = h.service.issue_otp(&r, "9000000000").unwrap();
    assert!(second.challenge_id > first.challenge_id);

    assert!(h.service.validate_otp(&r, "202020").is_ok());
    // The older challenge becomes eligible once the newer one is consumed.
    assert!(h.service.validate_otp(&r, "101010").is_ok());
}

#[test]
fn code_sent_to_old_number_cannot_verify_new_number() {
    let h = harness(vec![record("36", false, false)]);
    let r = roll("36");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();

    h.service.submit_edit(&r, details("9222222222")).unwrap();
    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::NoValidChallenge(_)));

    let stored = h.store().get_student(&r).unwrap();
    assert_eq!(stored.details.mobile_number, "9222222222");
    assert!(!stored.is_mobile_verified);

    h.service.issue_otp(&r, "9222222222").unwrap();
    let fresh = h.delivery.last_code().unwrap();
    assert!(h.service.validate_otp(&r, &fresh).unwrap().is_mobile_verified);
}

#[test]
fn code_sent_to_foreign_number_cannot_verify_record() {
    let h = harness(vec![record("37", false, false)]);
    let r = roll("37");
    h.service.issue_otp(&r, "9555555555").unwrap();
    let code = h.delivery.last_code().unwrap();

    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::NoValidChallenge(_)));
    assert!(!h.store().get_student(&r).unwrap().is_mobile_verified);
    assert!(!h.store().get_otp_challenges(&r).unwrap()[0].is_used);
}

#[test]
fn blank_inputs_are_invalid() {
    let h = harness(vec![record("34", false, false)]);
    let r = roll("34");
    assert!(matches!(
        h.service.issue_otp(&r, ""),
        Err(VerificationError::InvalidInput(_))
    ));
    assert!(matches!(
        h.service.validate_otp(&r, ""),
        Err(VerificationError::InvalidInput(_))
    ));
    assert!(h.delivery.sent().is_empty());
}

#[test]
fn code_is_delivered_but_never_returned() {
    let h = harness(vec![record("35", false, false)]);
    let r = roll("35");
    let receipt = h.service.issue_otp(&r, " 9000000000 ").unwrap();
    let sent = h.delivery.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].mobile_number, "9000000000");
    assert_eq!(sent[0].roll_no, r);

    let code = sent[0].code.expose().to_owned();
    assert!(!format!("{receipt:?}").contains(&code));
    let mismatch = h.service.validate_otp(&r, "999999").unwrap_err();
    assert!(!mismatch.to_string().contains(&code));
}

#[test]
fn failure_between_otp_writes_consumes_the_challenge() {
    let h = harness(vec![record("40", false, false)]);
    let r = roll("40");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();

    h.store().fail_next(Fault::WriteStudent);
    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::Persistence(_)));
    assert!(h.store().get_otp_challenges(&r).unwrap()[0].is_used);
    assert!(!h.store().get_student(&r).unwrap().is_mobile_verified);

    // Resubmitting the same code cannot succeed; a fresh OTP does.
    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert!(matches!(err, VerificationError::NoValidChallenge(_)));
    h.service.issue_otp(&r, "9000000000").unwrap();
    let fresh = h.delivery.last_code().unwrap();
    assert!(h.service.validate_otp(&r, &fresh).unwrap().is_mobile_verified);
}

#[test]
fn failure_marking_used_leaves_record_untouched() {
    let h = harness(vec![record("41", false, false)]);
    let r = roll("41");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();

    h.store().fail_next(Fault::MarkOtpUsed);
    let err = h.service.validate_otp(&r, &code).unwrap_err();
    assert_eq!(err.kind(), "persistence_error");
    assert!(!h.store().get_student(&r).unwrap().is_mobile_verified);
    // Nothing was consumed, so the same code still works.
    assert!(h.service.validate_otp(&r, &code).is_ok());
}

#[test]
fn verified_mobile_is_lost_when_number_changes_again() {
    let h = harness(vec![record("50", false, false)]);
    let r = roll("50");
    h.service.issue_otp(&r, "9000000000").unwrap();
    let code = h.delivery.last_code().unwrap();
    h.service.validate_otp(&r, &code).unwrap();
    h.service.request_data_verification(&r).unwrap();

    let rec = h.service.submit_edit(&r, details("9444444444")).unwrap();
    assert_eq!(rec.status(), VerificationStatus::Unverified);
    let err = h.service.request_data_verification(&r).unwrap_err();
    assert!(matches!(err, VerificationError::PreconditionFailed(_)));
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EventLog(Mutex<Vec<String>>);

impl EventLog {
    fn names(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn push(&self, name: impl Into<String>) {
        self.0.lock().unwrap().push(name.into());
    }
}

impl ServiceEvents for EventLog {
    fn record_edited(&self, transition: &Transition) {
        self.push(format!("edited:{}", transition.is_change()));
    }
    fn otp_issued(&self) {
        self.push("otp_issued");
    }
    fn mobile_verified(&self) {
        self.push("mobile_verified");
    }
    fn otp_rejected(&self, error: &VerificationError) {
        self.push(format!("otp_rejected:{}", error.kind()));
    }
    fn data_verified(&self) {
        self.push("data_verified");
    }
    fn data_verification_refused(&self) {
        self.push("data_refused");
    }
    fn persistence_failed(&self) {
        self.push("persistence_failed");
    }
}

#[test]
fn every_outcome_is_reported_once() {
    let log = Arc::new(EventLog::default());
    let store = NullStore::new().with_student(record("60", true, true));
    let service = VerificationService::new(Arc::new(store), VerificationConfig::default())
        .with_clock(Arc::new(NullClock::new(1_000)))
        .with_code_source(Arc::new(NullCodeSource::constant("482913")))
        .with_delivery(Arc::new(NullDelivery::new()))
        .with_events(log.clone());
    let r = roll("60");

    // No-op edits are not reported.
    service.submit_edit(&r, details("9000000000")).unwrap();
    service.submit_edit(&r, details("9111111111")).unwrap();
    service.request_data_verification(&r).unwrap_err();
    service.validate_otp(&r, "482913").unwrap_err();
    service.issue_otp(&r, "9111111111").unwrap();
    service.validate_otp(&r, "000000").unwrap_err();
    service.validate_otp(&r, "482913").unwrap();
    service.request_data_verification(&r).unwrap();
    service.store().fail_next(Fault::ReadStudent);
    service.get_student(&r).unwrap_err();

    assert_eq!(
        log.names(),
        [
            "edited:true",
            "data_refused",
            "otp_rejected:no_valid_challenge",
            "otp_issued",
            "otp_rejected:code_mismatch",
            "mobile_verified",
            "data_verified",
            "persistence_failed",
        ]
    );
}
