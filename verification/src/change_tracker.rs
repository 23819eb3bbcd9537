//! Change tracker: field-level diff of two record snapshots.

use sv_types::{ChangeLogEntry, ProtectedField, RollNo, Snapshot, Timestamp};

use crate::VerificationError;

/// The outcome of diffing two snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// One entry per changed field, in snapshot order.
    pub entries: Vec<ChangeLogEntry>,
    /// `mobile_number` is among the changed fields.
    pub mobile_changed: bool,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn changed_fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.field_name.as_str())
    }
}

/// Compare `old` against `new` field by field.
///
/// Both snapshots must cover the same field names; a field present in only one
/// of them fails with [`VerificationError::SchemaMismatch`]. Values are compared
/// as canonical strings. Pure: the caller persists the entries.
pub fn diff(
    record_id: &RollNo,
    old: &Snapshot,
    new: &Snapshot,
    at: Timestamp,
) -> Result<ChangeSet, VerificationError> {
    if let Some((name, _)) = new.iter().find(|(name, _)| !old.contains(name)) {
        return Err(VerificationError::SchemaMismatch {
            field: name.to_owned(),
        });
    }

    let mut changes = ChangeSet::default();
    for (name, old_value) in old.iter() {
        let new_value = new
            .get(name)
            .ok_or_else(|| VerificationError::SchemaMismatch {
                field: name.to_owned(),
            })?;
        if old_value == new_value {
            continue;
        }
        if name == ProtectedField::MobileNumber.as_str() {
            changes.mobile_changed = true;
        }
        changes.entries.push(ChangeLogEntry {
            record_id: record_id.clone(),
            field_name: name.to_owned(),
            old_value: old_value.to_owned(),
            new_value: new_value.to_owned(),
            timestamp: at,
        });
    }
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll() -> RollNo {
        RollNo::new("101").unwrap()
    }

    fn base() -> Snapshot {
        Snapshot::new()
            .with("name", "Asha Patil")
            .with("mobile_number", "9000000000")
            .with("address", "12 Mill Road")
    }

    #[test]
    fn identical_snapshots_produce_nothing() {
        let changes = diff(&roll(), &base(), &base(), Timestamp::new(1)).unwrap();
        assert!(changes.is_empty());
        assert!(!changes.mobile_changed);
    }

    #[test]
    fn entries_follow_snapshot_order() {
        let new = Snapshot::new()
            .with("name", "Asha R Patil")
            .with("mobile_number", "9000000000")
            .with("address", "4 Station Road");
        let changes = diff(&roll(), &base(), &new, Timestamp::new(9)).unwrap();
        assert_eq!(changes.changed_fields().collect::<Vec<_>>(), vec!["name", "address"]);
        assert!(!changes.mobile_changed);
        let first = &changes.entries[0];
        assert_eq!(first.old_value, "Asha Patil");
        assert_eq!(first.new_value, "Asha R Patil");
        assert_eq!(first.timestamp, Timestamp::new(9));
        assert_eq!(first.record_id, roll());
    }

    #[test]
    fn mobile_change_is_flagged() {
        let new = base().with("mobile_number", "9111111111");
        let changes = diff(&roll(), &base(), &new, Timestamp::new(1)).unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes.mobile_changed);
    }

    #[test]
    fn field_missing_from_new_is_schema_mismatch() {
        let new = Snapshot::new()
            .with("name", "Asha Patil")
            .with("mobile_number", "9000000000");
        let err = diff(&roll(), &base(), &new, Timestamp::new(1)).unwrap_err();
        assert!(matches!(err, VerificationError::SchemaMismatch { ref field } if field == "address"));
    }

    #[test]
    fn extra_field_in_new_is_schema_mismatch() {
        let new = base().with("branch", "Mechanical");
        let err = diff(&roll(), &base(), &new, Timestamp::new(1)).unwrap_err();
        assert!(matches!(err, VerificationError::SchemaMismatch { ref field } if field == "branch"));
    }
}
