//! Change history storage trait.

use crate::StoreError;
use sv_types::{ChangeLogEntry, RollNo};

/// Append-only audit trail of field changes.
pub trait ChangeLogStore {
    /// Append entries in the given order. Entries are never modified afterwards.
    fn append_changes(&self, entries: &[ChangeLogEntry]) -> Result<(), StoreError>;

    /// All entries for a record, newest first.
    ///
    /// Ordered by timestamp descending; entries sharing a timestamp are listed
    /// in reverse append order.
    fn get_changes(&self, roll_no: &RollNo) -> Result<Vec<ChangeLogEntry>, StoreError>;
}
