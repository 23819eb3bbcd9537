//! Pre-built [`tracing::Span`] constructors for the verification operations.
//!
//! Consistent span names and fields make a single record's history easy to
//! follow across edits, OTP rounds and verification.

use sv_types::RollNo;
use tracing::{info_span, Span};

/// Span covering a full or partial edit of a record.
pub fn edit_span(roll_no: &RollNo) -> Span {
    info_span!("record_edit", roll_no = %roll_no)
}

/// Span covering a data verification request.
pub fn verify_span(roll_no: &RollNo) -> Span {
    info_span!("data_verify", roll_no = %roll_no)
}

/// Span covering OTP issuance.
pub fn otp_issue_span(roll_no: &RollNo) -> Span {
    info_span!("otp_issue", roll_no = %roll_no)
}

/// Span covering OTP validation.
pub fn otp_validate_span(roll_no: &RollNo) -> Span {
    info_span!("otp_validate", roll_no = %roll_no)
}
