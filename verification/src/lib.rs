//! Student record verification core.
//!
//! Three cooperating pieces drive a record's verification status:
//! 1. **Change tracking**: diffing the stored snapshot against an edit,
//!    producing audit entries and deciding which flags to demote.
//! 2. **OTP challenge/response**: issuing six-digit codes bound to a mobile
//!    number and consuming them exactly once.
//! 3. **State machine**: `Unverified → MobileVerified → FullyVerified`, where
//!    data verification requires a verified mobile and edits only move back.
//!
//! [`VerificationService`] orchestrates them against a [`sv_store::RecordStore`].

pub mod change_tracker;
pub mod delivery;
pub mod error;
pub mod events;
pub mod locks;
pub mod otp;
pub mod service;
pub mod spans;
pub mod state_machine;

pub use change_tracker::{diff, ChangeSet};
pub use delivery::{LogDelivery, OtpDelivery};
pub use error::VerificationError;
pub use events::{NoEvents, ServiceEvents};
pub use otp::{CodeSource, OtpIssuer, OtpValidator, ThreadRngCodeSource, OTP_TTL_SECS};
pub use service::{OtpReceipt, VerificationConfig, VerificationService};
pub use state_machine::{Transition, VerificationStateMachine};
