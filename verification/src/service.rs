//! Verification service: orchestrates change tracking, OTP challenge/response
//! and the state machine against a record store.

use std::sync::{Arc, PoisonError};

use serde::{Deserialize, Serialize};
use sv_store::{RecordStore, StoreError};
use sv_types::{
    ChallengeId, ChangeLogEntry, Clock, DetailsPatch, RollNo, StudentDetails, StudentRecord,
    SystemClock, Timestamp,
};

use crate::change_tracker::diff;
use crate::delivery::{LogDelivery, OtpDelivery};
use crate::events::{NoEvents, ServiceEvents};
use crate::locks::RecordLocks;
use crate::otp::{CodeSource, OtpIssuer, OtpValidator, ThreadRngCodeSource, OTP_TTL_SECS};
use crate::spans;
use crate::state_machine::VerificationStateMachine;
use crate::VerificationError;

/// Tunables of the verification core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationConfig {
    /// Seconds an issued OTP stays valid.
    pub otp_ttl_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            otp_ttl_secs: OTP_TTL_SECS,
        }
    }
}

/// Acknowledgment of an issued OTP. Deliberately carries no code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OtpReceipt {
    pub challenge_id: ChallengeId,
    pub target_mobile_number: String,
    pub expires_at: Timestamp,
}

pub struct VerificationService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeSource>,
    delivery: Arc<dyn OtpDelivery>,
    events: Arc<dyn ServiceEvents>,
    issuer: OtpIssuer,
    validator: OtpValidator,
    machine: VerificationStateMachine,
    locks: RecordLocks,
}

impl<S: RecordStore> VerificationService<S> {
    /// A service using the system clock, random codes and log delivery.
    pub fn new(store: Arc<S>, config: VerificationConfig) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            codes: Arc::new(ThreadRngCodeSource),
            delivery: Arc::new(LogDelivery),
            events: Arc::new(NoEvents),
            issuer: OtpIssuer::new(config.otp_ttl_secs),
            validator: OtpValidator,
            machine: VerificationStateMachine,
            locks: RecordLocks::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_code_source(mut self, codes: Arc<dyn CodeSource>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_delivery(mut self, delivery: Arc<dyn OtpDelivery>) -> Self {
        self.delivery = delivery;
        self
    }

    /// Report outcomes to `events`, e.g. to count them as metrics.
    pub fn with_events(mut self, events: Arc<dyn ServiceEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn get_student(&self, roll_no: &RollNo) -> Result<StudentRecord, VerificationError> {
        self.load(roll_no)
    }

    /// Replace a record's details, log every changed field and demote its
    /// verification status accordingly.
    ///
    /// An edit that changes nothing writes nothing.
    pub fn submit_edit(
        &self,
        roll_no: &RollNo,
        details: StudentDetails,
    ) -> Result<StudentRecord, VerificationError> {
        let _span = spans::edit_span(roll_no).entered();
        let lock = self.locks.handle(roll_no);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self.load(roll_no)?;
        self.apply_edit(record, details)
    }

    /// Merge a partial edit onto the stored details, then proceed as
    /// [`VerificationService::submit_edit`].
    pub fn submit_patch(
        &self,
        roll_no: &RollNo,
        patch: &DetailsPatch,
    ) -> Result<StudentRecord, VerificationError> {
        let _span = spans::edit_span(roll_no).entered();
        let lock = self.locks.handle(roll_no);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let record = self.load(roll_no)?;
        let details = patch.apply_to(&record.details);
        self.apply_edit(record, details)
    }

    fn apply_edit(
        &self,
        mut record: StudentRecord,
        details: StudentDetails,
    ) -> Result<StudentRecord, VerificationError> {
        let now = self.clock.now();
        let changes = diff(
            &record.roll_no,
            &record.details.snapshot(),
            &details.snapshot(),
            now,
        )
        .inspect_err(|e| {
            tracing::error!(error = %e, "snapshot schema mismatch while diffing an edit");
        })?;

        if changes.is_empty() {
            tracing::debug!("edit changes nothing");
            return Ok(record);
        }

        for entry in &changes.entries {
            tracing::debug!(field = %entry.field_name, "field changed");
        }

        record.details = details;
        record.updated_at = now;
        let transition = self.machine.apply_changes(&mut record, &changes);

        self.store
            .commit_edit(&record, &changes.entries)
            .map_err(|e| self.persistence_failure("commit edit", e))?;

        tracing::info!(
            fields = changes.len(),
            mobile_changed = changes.mobile_changed,
            from = %transition.from,
            to = %transition.to,
            "record edited"
        );
        self.events.record_edited(&transition);
        Ok(record)
    }

    /// Promote a mobile-verified record to fully verified.
    pub fn request_data_verification(
        &self,
        roll_no: &RollNo,
    ) -> Result<StudentRecord, VerificationError> {
        let _span = spans::verify_span(roll_no).entered();
        let lock = self.locks.handle(roll_no);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.load(roll_no)?;
        let transition = self.machine.verify_data(&mut record).inspect_err(|e| {
            tracing::info!(reason = %e, "data verification refused");
            self.events.data_verification_refused();
        })?;
        record.updated_at = self.clock.now();

        self.store
            .put_student(&record)
            .map_err(|e| self.persistence_failure("save data verification", e))?;

        tracing::info!(from = %transition.from, to = %transition.to, "data verified");
        self.events.data_verified();
        Ok(record)
    }

    /// Issue a fresh OTP bound to `mobile_number` and hand it to the delivery
    /// channel. Returns an acknowledgment only.
    pub fn issue_otp(
        &self,
        roll_no: &RollNo,
        mobile_number: &str,
    ) -> Result<OtpReceipt, VerificationError> {
        let _span = spans::otp_issue_span(roll_no).entered();

        let record = self.load(roll_no)?;
        let now = self.clock.now();
        let challenge = self
            .issuer
            .issue(&*self.store, &record, mobile_number, self.codes.next_code(), now)
            .map_err(|e| match e {
                VerificationError::Persistence(inner) => {
                    self.persistence_failure("create OTP challenge", inner)
                }
                other => other,
            })?;

        self.delivery.deliver(
            roll_no,
            &challenge.target_mobile_number,
            &challenge.code,
            challenge.expires_at,
        );
        tracing::info!(
            challenge_id = %challenge.id,
            ttl_secs = self.issuer.ttl_secs(),
            "OTP issued"
        );
        self.events.otp_issued();

        Ok(OtpReceipt {
            challenge_id: challenge.id,
            target_mobile_number: challenge.target_mobile_number,
            expires_at: challenge.expires_at,
        })
    }

    /// Check a submitted code and, on a match, mark the mobile verified.
    ///
    /// The challenge is consumed before the record is written. If that second
    /// write fails the challenge stays consumed, the mobile stays unverified
    /// and the caller must request a new code.
    pub fn validate_otp(
        &self,
        roll_no: &RollNo,
        submitted_code: &str,
    ) -> Result<StudentRecord, VerificationError> {
        let _span = spans::otp_validate_span(roll_no).entered();
        let lock = self.locks.handle(roll_no);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut record = self.load(roll_no)?;
        let now = self.clock.now();
        let challenge = self
            .validator
            .validate(&*self.store, &record, submitted_code, now)
            .map_err(|e| match e {
                VerificationError::Persistence(inner) => {
                    self.persistence_failure("consume OTP challenge", inner)
                }
                other => {
                    tracing::info!(reason = other.kind(), "OTP rejected");
                    if matches!(
                        other,
                        VerificationError::CodeMismatch | VerificationError::NoValidChallenge(_)
                    ) {
                        self.events.otp_rejected(&other);
                    }
                    other
                }
            })?;

        let transition = self.machine.mark_mobile_verified(&mut record);
        record.updated_at = now;
        self.store.put_student(&record).map_err(|e| {
            tracing::warn!(
                challenge_id = %challenge.id,
                "OTP consumed but mobile verification not saved; a new OTP is required"
            );
            self.persistence_failure("save mobile verification", e)
        })?;

        tracing::info!(
            challenge_id = %challenge.id,
            from = %transition.from,
            to = %transition.to,
            "mobile verified"
        );
        self.events.mobile_verified();
        Ok(record)
    }

    /// The record's audit trail, newest first.
    pub fn get_change_history(
        &self,
        roll_no: &RollNo,
    ) -> Result<Vec<ChangeLogEntry>, VerificationError> {
        if !self
            .store
            .student_exists(roll_no)
            .map_err(|e| self.persistence_failure("check student", e))?
        {
            return Err(VerificationError::NotFound(roll_no.clone()));
        }
        self.store
            .get_changes(roll_no)
            .map_err(|e| self.persistence_failure("read change history", e))
    }

    fn load(&self, roll_no: &RollNo) -> Result<StudentRecord, VerificationError> {
        match self.store.get_student(roll_no) {
            Ok(record) => Ok(record),
            Err(StoreError::NotFound(_)) => Err(VerificationError::NotFound(roll_no.clone())),
            Err(e) => Err(self.persistence_failure("load student", e)),
        }
    }

    fn persistence_failure(&self, action: &str, e: StoreError) -> VerificationError {
        tracing::warn!(action, error = %e, "store operation failed");
        self.events.persistence_failed();
        VerificationError::Persistence(e)
    }
}
