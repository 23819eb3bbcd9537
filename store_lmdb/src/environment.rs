//! LMDB environment setup.

use std::path::Path;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use sv_store::RecordStore;
use sv_types::{ChangeLogEntry, StudentRecord};

use crate::change_log::append_in;
use crate::migration::Migrator;
use crate::LmdbError;

/// Number of named databases opened by [`LmdbEnvironment::open`].
pub const DATABASE_COUNT: u32 = 4;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    pub(crate) env: Env,
    pub(crate) students_db: Database<Bytes, Bytes>,
    pub(crate) changes_db: Database<Bytes, Bytes>,
    pub(crate) otps_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory and bring
    /// its schema up to date.
    pub fn open(path: &Path, max_dbs: u32, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process per directory;
        // the daemon owns the data directory exclusively.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(max_dbs.max(DATABASE_COUNT))
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let students_db = env.create_database(&mut wtxn, Some("students"))?;
        let changes_db = env.create_database(&mut wtxn, Some("change_log"))?;
        let otps_db = env.create_database(&mut wtxn, Some("otp_challenges"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let this = Self {
            env,
            students_db,
            changes_db,
            otps_db,
            meta_db,
        };
        Migrator::run(&this)?;

        tracing::info!(path = %path.display(), "LMDB environment opened");
        Ok(this)
    }

    pub fn env(&self) -> &Env {
        &self.env
    }
}

impl RecordStore for LmdbEnvironment {
    /// Record and change entries land in one write transaction.
    fn commit_edit(
        &self,
        record: &StudentRecord,
        entries: &[ChangeLogEntry],
    ) -> Result<(), sv_store::StoreError> {
        let bytes = bincode::serialize(record).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.students_db
            .put(&mut wtxn, record.roll_no.as_str().as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        append_in(self, &mut wtxn, entries)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
