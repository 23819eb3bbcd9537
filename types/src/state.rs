//! Verification status derived from a record's two flags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a record sits in the verification sequence.
///
/// `Unverified → MobileVerified → FullyVerified`; edits only move backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Unverified,
    MobileVerified,
    FullyVerified,
}

impl VerificationStatus {
    /// Map the stored flags onto a status.
    ///
    /// A record whose data flag is set without the mobile flag can only come
    /// from outside the core (e.g. a hand-edited store); it reads as `Unverified`.
    pub fn from_flags(mobile_verified: bool, data_verified: bool) -> Self {
        match (mobile_verified, data_verified) {
            (true, true) => Self::FullyVerified,
            (true, false) => Self::MobileVerified,
            (false, _) => Self::Unverified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::MobileVerified => "mobile_verified",
            Self::FullyVerified => "fully_verified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
