//! Canonical string encoding of field values.
//!
//! Change detection compares fields by their canonical form so that type
//! differences never produce spurious (or missed) changes.

use chrono::NaiveDate;

/// Encode a value as the string stored in change-log entries and compared by
/// the change tracker.
pub trait Canonical {
    fn canonical(&self) -> String;
}

impl Canonical for String {
    fn canonical(&self) -> String {
        self.clone()
    }
}

impl Canonical for str {
    fn canonical(&self) -> String {
        self.to_owned()
    }
}

/// ISO 8601 calendar date, `YYYY-MM-DD`.
impl Canonical for NaiveDate {
    fn canonical(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl Canonical for bool {
    fn canonical(&self) -> String {
        let word = if *self { "true" } else { "false" };
        word.to_owned()
    }
}

/// An absent optional value encodes as the empty string.
impl<T: Canonical> Canonical for Option<T> {
    fn canonical(&self) -> String {
        self.as_ref().map(|v| v.canonical()).unwrap_or_default()
    }
}
