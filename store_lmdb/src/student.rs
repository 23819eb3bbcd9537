//! LMDB implementation of StudentStore.

use sv_store::student::StudentStore;
use sv_store::StoreError;
use sv_types::{RollNo, StudentRecord};

use crate::{LmdbEnvironment, LmdbError};

impl StudentStore for LmdbEnvironment {
    fn get_student(&self, roll_no: &RollNo) -> Result<StudentRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .students_db
            .get(&rtxn, roll_no.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("student {roll_no}")))?;
        let record = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        Ok(record)
    }

    fn put_student(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.students_db
            .put(&mut wtxn, record.roll_no.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn insert_student(&self, record: &StudentRecord) -> Result<(), StoreError> {
        let key = record.roll_no.as_str().as_bytes();
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        if self
            .students_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(format!("student {}", record.roll_no)));
        }
        self.students_db
            .put(&mut wtxn, key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn student_exists(&self, roll_no: &RollNo) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .students_db
            .get(&rtxn, roll_no.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.students_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
