//! Audit trail entries.

use serde::{Deserialize, Serialize};

use crate::{RollNo, Timestamp};

/// One changed field of one edit. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    pub record_id: RollNo,
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub timestamp: Timestamp,
}
