//! OTP issuer and validator.

use rand::Rng;
use sv_store::{OtpStore, StoreError};
use sv_types::{OtpChallenge, OtpCode, PendingChallenge, StudentRecord, Timestamp, OTP_CODE_LEN};

use crate::VerificationError;

/// Lifetime of an issued code.
pub const OTP_TTL_SECS: u64 = 10 * 60;

/// Supplies fresh codes.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> OtpCode;
}

/// Each digit drawn independently and uniformly from 0 to 9.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngCodeSource;

impl CodeSource for ThreadRngCodeSource {
    fn next_code(&self) -> OtpCode {
        let mut rng = rand::thread_rng();
        let mut digits = [0u8; OTP_CODE_LEN];
        for d in digits.iter_mut() {
            *d = rng.gen_range(0..10);
        }
        OtpCode::from_digits(digits)
    }
}

/// Creates challenges. Older unused challenges stay in place; recency decides
/// which one is checked.
pub struct OtpIssuer {
    ttl_secs: u64,
}

impl OtpIssuer {
    pub fn new(ttl_secs: u64) -> Self {
        Self { ttl_secs }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Build and persist a challenge for `record` targeting `mobile_number`.
    pub fn issue<S: OtpStore + ?Sized>(
        &self,
        store: &S,
        record: &StudentRecord,
        mobile_number: &str,
        code: OtpCode,
        now: Timestamp,
    ) -> Result<OtpChallenge, VerificationError> {
        let mobile_number = mobile_number.trim();
        if mobile_number.is_empty() {
            return Err(VerificationError::InvalidInput(
                "mobile number is required".to_owned(),
            ));
        }
        let pending = PendingChallenge {
            record_id: record.roll_no.clone(),
            code,
            target_mobile_number: mobile_number.to_owned(),
            created_at: now,
            expires_at: now.plus_secs(self.ttl_secs),
        };
        Ok(store.create_otp_challenge(pending)?)
    }
}

impl Default for OtpIssuer {
    fn default() -> Self {
        Self::new(OTP_TTL_SECS)
    }
}

/// Consumes challenges.
pub struct OtpValidator;

impl OtpValidator {
    /// Check `submitted` against the latest eligible challenge for `record`
    /// and mark that challenge used on a match.
    ///
    /// A mismatch leaves the challenge untouched so it can be retried until it
    /// expires. A challenge sent to a number the record no longer holds, or
    /// never held, proves nothing about the current number and reads as
    /// [`VerificationError::NoValidChallenge`], as does losing a race for the
    /// same challenge.
    pub fn validate<S: OtpStore + ?Sized>(
        &self,
        store: &S,
        record: &StudentRecord,
        submitted: &str,
        now: Timestamp,
    ) -> Result<OtpChallenge, VerificationError> {
        if submitted.trim().is_empty() {
            return Err(VerificationError::InvalidInput("OTP is required".to_owned()));
        }

        let roll_no = &record.roll_no;
        let mut challenge = store
            .find_latest_valid_otp(roll_no, now)?
            .ok_or_else(|| VerificationError::NoValidChallenge(roll_no.clone()))?;

        if challenge.target_mobile_number != record.details.mobile_number.trim() {
            tracing::debug!(
                roll_no = %roll_no,
                challenge_id = %challenge.id,
                "latest challenge targets a different mobile number"
            );
            return Err(VerificationError::NoValidChallenge(roll_no.clone()));
        }

        if !challenge.code.matches(submitted) {
            tracing::debug!(roll_no = %roll_no, challenge_id = %challenge.id, "OTP mismatch");
            return Err(VerificationError::CodeMismatch);
        }

        match store.mark_otp_used(roll_no, challenge.id) {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(VerificationError::NoValidChallenge(roll_no.clone()))
            }
            Err(e) => return Err(e.into()),
        }
        challenge.is_used = true;
        Ok(challenge)
    }
}
