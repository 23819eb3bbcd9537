//! LMDB implementation of OtpStore.

use sv_store::otp::{latest_eligible, OtpStore};
use sv_store::StoreError;
use sv_types::{ChallengeId, OtpChallenge, PendingChallenge, RollNo, Timestamp};

use crate::keys::{child_key, record_prefix};
use crate::meta::NEXT_OTP_ID_KEY;
use crate::{LmdbEnvironment, LmdbError};

impl OtpStore for LmdbEnvironment {
    fn create_otp_challenge(&self, pending: PendingChallenge) -> Result<OtpChallenge, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = ChallengeId(self.next_id(&mut wtxn, NEXT_OTP_ID_KEY)?);
        let challenge = pending.into_challenge(id);
        let bytes = bincode::serialize(&challenge).map_err(LmdbError::from)?;
        self.otps_db
            .put(&mut wtxn, &child_key(&challenge.record_id, id.0), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(challenge)
    }

    fn mark_otp_used(&self, roll_no: &RollNo, id: ChallengeId) -> Result<(), StoreError> {
        let key = child_key(roll_no, id.0);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let bytes = self
            .otps_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("otp challenge {id} for {roll_no}")))?;
        let mut challenge: OtpChallenge = bincode::deserialize(bytes).map_err(LmdbError::from)?;
        if challenge.is_used {
            return Err(StoreError::Conflict(format!(
                "otp challenge {id} for {roll_no} already used"
            )));
        }
        challenge.is_used = true;
        let bytes = bincode::serialize(&challenge).map_err(LmdbError::from)?;
        self.otps_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn find_latest_valid_otp(
        &self,
        roll_no: &RollNo,
        now: Timestamp,
    ) -> Result<Option<OtpChallenge>, StoreError> {
        Ok(latest_eligible(self.get_otp_challenges(roll_no)?, now))
    }

    fn get_otp_challenges(&self, roll_no: &RollNo) -> Result<Vec<OtpChallenge>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let prefix = record_prefix(roll_no);
        let iter = self
            .otps_db
            .prefix_iter(&rtxn, &prefix)
            .map_err(LmdbError::from)?;
        let mut challenges = Vec::new();
        for result in iter {
            let (_key, val) = result.map_err(LmdbError::from)?;
            challenges.push(bincode::deserialize(val).map_err(LmdbError::from)?);
        }
        Ok(challenges)
    }
}
