//! Fundamental types for student record verification.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! roll numbers, timestamps, student records and their snapshots, change-log
//! entries, OTP challenges and the derived verification status.

pub mod canonical;
pub mod change;
pub mod error;
pub mod otp;
pub mod record;
pub mod roll_no;
pub mod snapshot;
pub mod state;
pub mod time;

pub use canonical::Canonical;
pub use change::ChangeLogEntry;
pub use error::TypesError;
pub use otp::{ChallengeId, OtpChallenge, OtpCode, PendingChallenge, OTP_CODE_LEN};
pub use record::{DetailsPatch, ProtectedField, StudentDetails, StudentRecord};
pub use roll_no::RollNo;
pub use snapshot::Snapshot;
pub use state::VerificationStatus;
pub use time::{Clock, SystemClock, Timestamp};
