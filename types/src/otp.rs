//! One-time passcode challenges.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{RollNo, Timestamp, TypesError};

/// Number of digits in every OTP code.
pub const OTP_CODE_LEN: usize = 6;

/// A fixed-width numeric passcode. Leading zeros are significant.
///
/// `Debug` never prints the digits and there is no `Display`; use
/// [`OtpCode::expose`] at the one place that must see them (delivery).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OtpCode(String);

impl OtpCode {
    /// Parse a code of exactly [`OTP_CODE_LEN`] ASCII digits.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.len() != OTP_CODE_LEN || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypesError::InvalidOtpCode {
                expected: OTP_CODE_LEN,
            });
        }
        Ok(Self(s))
    }

    /// Build a code from individual digit values (each taken modulo 10).
    pub fn from_digits(digits: [u8; OTP_CODE_LEN]) -> Self {
        Self(digits.iter().map(|d| char::from(b'0' + d % 10)).collect())
    }

    /// Exact string comparison against a submitted code.
    pub fn matches(&self, submitted: &str) -> bool {
        self.0 == submitted
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OtpCode(******)")
    }
}

impl TryFrom<String> for OtpCode {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<OtpCode> for String {
    fn from(c: OtpCode) -> Self {
        c.0
    }
}

/// Store-assigned identity of a challenge, monotonically increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChallengeId(pub u64);

impl fmt::Display for ChallengeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A challenge that has been generated but not yet assigned an id by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingChallenge {
    pub record_id: RollNo,
    pub code: OtpCode,
    pub target_mobile_number: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl PendingChallenge {
    pub fn into_challenge(self, id: ChallengeId) -> OtpChallenge {
        OtpChallenge {
            id,
            record_id: self.record_id,
            code: self.code,
            target_mobile_number: self.target_mobile_number,
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_used: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpChallenge {
    pub id: ChallengeId,
    pub record_id: RollNo,
    pub code: OtpCode,
    pub target_mobile_number: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub is_used: bool,
}

impl OtpChallenge {
    /// Expiry is exclusive: a challenge is dead at `expires_at`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }

    /// Unused and unexpired.
    pub fn is_eligible(&self, now: Timestamp) -> bool {
        !self.is_used && !self.is_expired(now)
    }

    /// Sort key for "most recently created": creation time, then id.
    pub fn recency_key(&self) -> (Timestamp, ChallengeId) {
        (self.created_at, self.id)
    }
}
