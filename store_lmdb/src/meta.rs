//! Metadata: schema version and id counters.

use heed::{RoTxn, RwTxn};

use crate::{LmdbEnvironment, LmdbError};

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
pub(crate) const NEXT_CHANGE_SEQ_KEY: &[u8] = b"next_change_seq";
pub(crate) const NEXT_OTP_ID_KEY: &[u8] = b"next_otp_id";

impl LmdbEnvironment {
    pub fn get_schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let val = self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)?;
        match val {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("schema_version has unexpected byte length".into())
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let mut wtxn = self.env.write_txn()?;
        self.meta_db
            .put(&mut wtxn, SCHEMA_VERSION_KEY, &version.to_le_bytes())?;
        wtxn.commit()?;
        Ok(())
    }

    fn read_counter(&self, txn: &RoTxn, key: &[u8]) -> Result<u64, LmdbError> {
        match self.meta_db.get(txn, key)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("counter has unexpected byte length".into())
                })?;
                Ok(u64::from_le_bytes(arr))
            }
            None => Ok(1),
        }
    }

    /// Reserve the next value of a counter inside an open write transaction.
    /// Counters start at 1.
    pub(crate) fn next_id(&self, wtxn: &mut RwTxn, key: &[u8]) -> Result<u64, LmdbError> {
        let id = self.read_counter(wtxn, key)?;
        self.meta_db.put(wtxn, key, &(id + 1).to_le_bytes())?;
        Ok(id)
    }
}
