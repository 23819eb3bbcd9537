//! Student record storage trait.

use crate::StoreError;
use sv_types::{RollNo, StudentRecord};

/// Keyed storage of student records by roll number.
pub trait StudentStore {
    /// Fetch a record; [`StoreError::NotFound`] for unknown roll numbers.
    fn get_student(&self, roll_no: &RollNo) -> Result<StudentRecord, StoreError>;

    /// Create or overwrite a record.
    fn put_student(&self, record: &StudentRecord) -> Result<(), StoreError>;

    /// Create a record; [`StoreError::Duplicate`] if the roll number is taken.
    fn insert_student(&self, record: &StudentRecord) -> Result<(), StoreError>;

    fn student_exists(&self, roll_no: &RollNo) -> Result<bool, StoreError>;

    fn student_count(&self) -> Result<u64, StoreError>;
}
