//! OTP challenge storage trait.

use crate::StoreError;
use sv_types::{ChallengeId, OtpChallenge, PendingChallenge, RollNo, Timestamp};

pub trait OtpStore {
    /// Persist a new challenge, assigning it the next [`ChallengeId`].
    fn create_otp_challenge(&self, pending: PendingChallenge) -> Result<OtpChallenge, StoreError>;

    /// Flip `is_used` on a challenge.
    ///
    /// [`StoreError::NotFound`] if it does not exist, [`StoreError::Conflict`]
    /// if it was already used.
    fn mark_otp_used(&self, roll_no: &RollNo, id: ChallengeId) -> Result<(), StoreError>;

    /// The most recently created challenge that is unused and unexpired at `now`.
    ///
    /// Recency is `created_at` descending, ties broken by the higher id.
    fn find_latest_valid_otp(
        &self,
        roll_no: &RollNo,
        now: Timestamp,
    ) -> Result<Option<OtpChallenge>, StoreError>;

    /// Every challenge ever issued for a record, oldest first.
    fn get_otp_challenges(&self, roll_no: &RollNo) -> Result<Vec<OtpChallenge>, StoreError>;
}

/// Pick the eligible challenge with the greatest recency key.
///
/// Shared by backends that scan all of a record's challenges.
pub fn latest_eligible<I>(challenges: I, now: Timestamp) -> Option<OtpChallenge>
where
    I: IntoIterator<Item = OtpChallenge>,
{
    challenges
        .into_iter()
        .filter(|c| c.is_eligible(now))
        .max_by_key(|c| c.recency_key())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sv_types::OtpCode;

    fn ch(id: u64, created: u64, used: bool) -> OtpChallenge {
        let mut c = PendingChallenge {
            record_id: RollNo::new("7").unwrap(),
            code: OtpCode::new("000000").unwrap(),
            target_mobile_number: "9000000000".into(),
            created_at: Timestamp::new(created),
            expires_at: Timestamp::new(created + 600),
        }
        .into_challenge(ChallengeId(id));
        c.is_used = used;
        c
    }

    #[test]
    fn skips_used_and_expired() {
        let now = Timestamp::new(1000);
        let picked = latest_eligible(vec![ch(1, 900, false), ch(2, 950, true), ch(3, 100, false)], now);
        assert_eq!(picked.map(|c| c.id), Some(ChallengeId(1)));
    }

    #[test]
    fn newest_creation_wins_then_highest_id() {
        let now = Timestamp::new(1000);
        let picked = latest_eligible(vec![ch(5, 900, false), ch(4, 950, false), ch(6, 950, false)], now);
        assert_eq!(picked.map(|c| c.id), Some(ChallengeId(6)));
    }

    #[test]
    fn none_when_nothing_eligible() {
        assert!(latest_eligible(Vec::new(), Timestamp::new(0)).is_none());
    }
}
