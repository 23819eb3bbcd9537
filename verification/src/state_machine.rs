//! Verification state machine: owns the two status flags.
//!
//! ```text
//!   Unverified ──otp──▶ MobileVerified ──verify──▶ FullyVerified
//!        ▲                   ▲    │                      │
//!        └──mobile edit──────┼────┘                      │
//!        └──mobile edit──────┴──────other edit───────────┘
//! ```

use sv_types::{StudentRecord, VerificationStatus};

use crate::{ChangeSet, VerificationError};

/// Message carried by the precondition failure of data verification.
pub const MOBILE_FIRST: &str = "mobile number must be verified first";

/// A status change applied to a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub from: VerificationStatus,
    pub to: VerificationStatus,
}

impl Transition {
    pub fn is_change(&self) -> bool {
        self.from != self.to
    }
}

pub struct VerificationStateMachine;

impl VerificationStateMachine {
    /// Demote a record after an edit.
    ///
    /// Any change clears `is_data_verified`; a mobile change also clears
    /// `is_mobile_verified`. An empty change set leaves both flags alone.
    pub fn apply_changes(&self, record: &mut StudentRecord, changes: &ChangeSet) -> Transition {
        let from = record.status();
        if !changes.is_empty() {
            record.is_data_verified = false;
            if changes.mobile_changed {
                record.is_mobile_verified = false;
            }
        }
        Transition {
            from,
            to: record.status(),
        }
    }

    /// Record a successful OTP validation.
    pub fn mark_mobile_verified(&self, record: &mut StudentRecord) -> Transition {
        let from = record.status();
        record.is_mobile_verified = true;
        Transition {
            from,
            to: record.status(),
        }
    }

    /// The only path to `FullyVerified`; requires a verified mobile.
    pub fn verify_data(&self, record: &mut StudentRecord) -> Result<Transition, VerificationError> {
        if !record.is_mobile_verified {
            return Err(VerificationError::PreconditionFailed(MOBILE_FIRST.to_owned()));
        }
        let from = record.status();
        record.is_data_verified = true;
        Ok(Transition {
            from,
            to: record.status(),
        })
    }
}
