//! Errors raised while constructing fundamental types from untrusted input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid roll number: {0}")]
    InvalidRollNo(String),

    #[error("OTP code must be exactly {expected} ASCII digits")]
    InvalidOtpCode { expected: usize },
}
