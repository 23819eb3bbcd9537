//! LMDB implementation of ChangeLogStore.
//!
//! Entries are keyed `roll_no ++ 0x00 ++ seq_be` with a global append
//! sequence, so a prefix scan yields a record's entries in append order.

use heed::RwTxn;

use sv_store::change_log::ChangeLogStore;
use sv_store::StoreError;
use sv_types::{ChangeLogEntry, RollNo};

use crate::keys::{child_key, record_prefix};
use crate::meta::NEXT_CHANGE_SEQ_KEY;
use crate::{LmdbEnvironment, LmdbError};

/// Append entries inside an existing write transaction.
pub(crate) fn append_in(
    env: &LmdbEnvironment,
    wtxn: &mut RwTxn,
    entries: &[ChangeLogEntry],
) -> Result<(), LmdbError> {
    for entry in entries {
        let seq = env.next_id(wtxn, NEXT_CHANGE_SEQ_KEY)?;
        let bytes = bincode::serialize(entry)?;
        env.changes_db
            .put(wtxn, &child_key(&entry.record_id, seq), &bytes)?;
    }
    Ok(())
}

impl ChangeLogStore for LmdbEnvironment {
    fn append_changes(&self, entries: &[ChangeLogEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        append_in(self, &mut wtxn, entries)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_changes(&self, roll_no: &RollNo) -> Result<Vec<ChangeLogEntry>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = record_prefix(roll_no);
        let iter = self
            .changes_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut entries = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            let entry: ChangeLogEntry = bincode::deserialize(val).map_err(LmdbError::from)?;
            entries.push(entry);
        }
        entries.reverse();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(entries)
    }
}
