//! Abstract storage traits for student record verification.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The verification core depends only on the traits.

pub mod change_log;
pub mod error;
pub mod otp;
pub mod student;

pub use change_log::ChangeLogStore;
pub use error::StoreError;
pub use otp::OtpStore;
pub use student::StudentStore;

use sv_types::{ChangeLogEntry, StudentRecord};

/// Everything the verification service needs from a backend.
pub trait RecordStore: StudentStore + ChangeLogStore + OtpStore + Send + Sync {
    /// Persist an edited record together with the change entries it produced.
    ///
    /// Backends that support transactions must apply both or neither. The
    /// default applies them in sequence.
    fn commit_edit(
        &self,
        record: &StudentRecord,
        entries: &[ChangeLogEntry],
    ) -> Result<(), StoreError> {
        self.put_student(record)?;
        self.append_changes(entries)
    }
}
