#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use sv_types::{RollNo, Snapshot, Timestamp};
use sv_verification::{diff, VerificationError};

#[derive(Debug, Arbitrary)]
struct Input {
    old: Vec<(String, String)>,
    new: Vec<(String, String)>,
    at: u64,
}

// Diff arbitrary snapshots. It must never panic, and when it succeeds every
// entry must describe a real change between the two snapshots.
fuzz_target!(|input: Input| {
    let roll_no = match RollNo::new("FUZZ") {
        Ok(r) => r,
        Err(_) => return,
    };
    let old: Snapshot = input.old.into_iter().collect();
    let new: Snapshot = input.new.into_iter().collect();

    match diff(&roll_no, &old, &new, Timestamp::new(input.at)) {
        Ok(changes) => {
            assert_eq!(old.len(), new.len());
            for entry in &changes.entries {
                assert_ne!(entry.old_value, entry.new_value);
                assert_eq!(old.get(&entry.field_name), Some(entry.old_value.as_str()));
                assert_eq!(new.get(&entry.field_name), Some(entry.new_value.as_str()));
            }
        }
        Err(VerificationError::SchemaMismatch { field }) => {
            assert!(!old.contains(&field) || !new.contains(&field));
        }
        Err(other) => panic!("unexpected error: {other}"),
    }
});
