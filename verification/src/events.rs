//! Outcome hooks for the verification service.
//!
//! The service reports each outcome once, after it is decided. Every method
//! has an empty default so an observer implements only what it counts.

use crate::state_machine::Transition;
use crate::VerificationError;

pub trait ServiceEvents: Send + Sync {
    /// An edit was committed.
    fn record_edited(&self, _transition: &Transition) {}

    fn otp_issued(&self) {}

    fn mobile_verified(&self) {}

    /// A submitted code was refused: mismatch or no valid challenge.
    fn otp_rejected(&self, _error: &VerificationError) {}

    fn data_verified(&self) {}

    fn data_verification_refused(&self) {}

    /// A store operation failed and surfaced as a persistence error.
    fn persistence_failed(&self) {}
}

/// Ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoEvents;

impl ServiceEvents for NoEvents {}
