//! Nullable store: thread-safe in-memory storage with fault injection.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use sv_store::otp::latest_eligible;
use sv_store::{ChangeLogStore, OtpStore, RecordStore, StoreError, StudentStore};
use sv_types::{
    ChallengeId, ChangeLogEntry, OtpChallenge, PendingChallenge, RollNo, StudentRecord, Timestamp,
};

/// Operations that can be made to fail once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Fault {
    ReadStudent,
    WriteStudent,
    AppendChanges,
    CreateOtp,
    MarkOtpUsed,
}

/// An in-memory record store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    students: Mutex<HashMap<String, StudentRecord>>,
    changes: Mutex<Vec<ChangeLogEntry>>,
    otps: Mutex<Vec<OtpChallenge>>,
    armed: Mutex<HashSet<Fault>>,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            students: Mutex::new(HashMap::new()),
            changes: Mutex::new(Vec::new()),
            otps: Mutex::new(Vec::new()),
            armed: Mutex::new(HashSet::new()),
        }
    }

    /// Builder: seed a record.
    pub fn with_student(self, record: StudentRecord) -> Self {
        self.students
            .lock()
            .unwrap()
            .insert(record.roll_no.to_string(), record);
        self
    }

    /// Make the next call of `fault`'s operation fail with a backend error.
    pub fn fail_next(&self, fault: Fault) {
        self.armed.lock().unwrap().insert(fault);
    }

    /// Total number of change entries across all records.
    pub fn change_count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }

    fn trip(&self, fault: Fault) -> Result<(), StoreError> {
        if self.armed.lock().unwrap().remove(&fault) {
            Err(StoreError::Backend(format!("injected fault: {fault:?}")))
        } else {
            Ok(())
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentStore for NullStore {
    fn get_student(&self, roll_no: &RollNo) -> Result<StudentRecord, StoreError> {
        self.trip(Fault::ReadStudent)?;
        self.students
            .lock()
            .unwrap()
            .get(roll_no.as_str())
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("student {roll_no}")))
    }

    fn put_student(&self, record: &StudentRecord) -> Result<(), StoreError> {
        self.trip(Fault::WriteStudent)?;
        self.students
            .lock()
            .unwrap()
            .insert(record.roll_no.to_string(), record.clone());
        Ok(())
    }

    fn insert_student(&self, record: &StudentRecord) -> Result<(), StoreError> {
        self.trip(Fault::WriteStudent)?;
        let mut students = self.students.lock().unwrap();
        if students.contains_key(record.roll_no.as_str()) {
            return Err(StoreError::Duplicate(format!("student {}", record.roll_no)));
        }
        students.insert(record.roll_no.to_string(), record.clone());
        Ok(())
    }

    fn student_exists(&self, roll_no: &RollNo) -> Result<bool, StoreError> {
        Ok(self.students.lock().unwrap().contains_key(roll_no.as_str()))
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        Ok(self.students.lock().unwrap().len() as u64)
    }
}

impl ChangeLogStore for NullStore {
    fn append_changes(&self, entries: &[ChangeLogEntry]) -> Result<(), StoreError> {
        self.trip(Fault::AppendChanges)?;
        self.changes.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }

    fn get_changes(&self, roll_no: &RollNo) -> Result<Vec<ChangeLogEntry>, StoreError> {
        let mut entries: Vec<ChangeLogEntry> = self
            .changes
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| e.record_id == *roll_no)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}

impl OtpStore for NullStore {
    fn create_otp_challenge(&self, pending: PendingChallenge) -> Result<OtpChallenge, StoreError> {
        self.trip(Fault::CreateOtp)?;
        let mut otps = self.otps.lock().unwrap();
        let challenge = pending.into_challenge(ChallengeId(otps.len() as u64 + 1));
        otps.push(challenge.clone());
        Ok(challenge)
    }

    fn mark_otp_used(&self, roll_no: &RollNo, id: ChallengeId) -> Result<(), StoreError> {
        self.trip(Fault::MarkOtpUsed)?;
        let mut otps = self.otps.lock().unwrap();
        let challenge = otps
            .iter_mut()
            .find(|c| c.id == id && c.record_id == *roll_no)
            .ok_or_else(|| StoreError::NotFound(format!("otp challenge {id} for {roll_no}")))?;
        if challenge.is_used {
            return Err(StoreError::Conflict(format!(
                "otp challenge {id} for {roll_no} already used"
            )));
        }
        challenge.is_used = true;
        Ok(())
    }

    fn find_latest_valid_otp(
        &self,
        roll_no: &RollNo,
        now: Timestamp,
    ) -> Result<Option<OtpChallenge>, StoreError> {
        Ok(latest_eligible(self.get_otp_challenges(roll_no)?, now))
    }

    fn get_otp_challenges(&self, roll_no: &RollNo) -> Result<Vec<OtpChallenge>, StoreError> {
        Ok(self
            .otps
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.record_id == *roll_no)
            .cloned()
            .collect())
    }
}

impl RecordStore for NullStore {
    /// All-or-nothing, like a transactional backend.
    fn commit_edit(
        &self,
        record: &StudentRecord,
        entries: &[ChangeLogEntry],
    ) -> Result<(), StoreError> {
        self.trip(Fault::WriteStudent)?;
        self.trip(Fault::AppendChanges)?;
        let mut students = self.students.lock().unwrap();
        let mut changes = self.changes.lock().unwrap();
        students.insert(record.roll_no.to_string(), record.clone());
        changes.extend_from_slice(entries);
        Ok(())
    }
}
