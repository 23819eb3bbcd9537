//! Composite key layout.
//!
//! Per-record child rows (change entries, OTP challenges) use
//! `roll_no_bytes ++ 0x00 ++ id_be`. Roll numbers never contain a NUL byte, so
//! the separator keeps `"10"` from prefix-matching `"101"`, and big-endian ids
//! make LMDB's byte order equal to append order.

use sv_types::RollNo;

const SEPARATOR: u8 = 0x00;

/// Key prefix covering every child row of a record.
pub fn record_prefix(roll_no: &RollNo) -> Vec<u8> {
    let r = roll_no.as_str().as_bytes();
    let mut key = Vec::with_capacity(r.len() + 1);
    key.extend_from_slice(r);
    key.push(SEPARATOR);
    key
}

/// Full key of one child row.
pub fn child_key(roll_no: &RollNo, id: u64) -> Vec<u8> {
    let mut key = record_prefix(roll_no);
    key.extend_from_slice(&id.to_be_bytes());
    key
}
