//! Per-record mutual exclusion for read-modify-write sequences.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sv_types::RollNo;

/// Hands out one mutex per roll number.
///
/// Operations on different records never contend; operations on the same
/// record run one at a time within this process.
#[derive(Default)]
pub struct RecordLocks {
    locks: Mutex<HashMap<RollNo, Arc<Mutex<()>>>>,
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `roll_no`. Hold its guard for the whole sequence.
    ///
    /// Entries nobody else holds are dropped on the way, so the map only
    /// grows with the number of records being worked on concurrently.
    pub fn handle(&self, roll_no: &RollNo) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.retain(|key, lock| key == roll_no || Arc::strong_count(lock) > 1);
        locks.entry(roll_no.clone()).or_default().clone()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_roll_shares_a_lock() {
        let locks = RecordLocks::new();
        let roll = RollNo::new("101").unwrap();
        let a = locks.handle(&roll);
        let b = locks.handle(&roll);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn idle_entries_are_pruned() {
        let locks = RecordLocks::new();
        drop(locks.handle(&RollNo::new("1").unwrap()));
        let _held = locks.handle(&RollNo::new("2").unwrap());
        locks.handle(&RollNo::new("3").unwrap());
        assert_eq!(locks.len(), 2);
    }
}
