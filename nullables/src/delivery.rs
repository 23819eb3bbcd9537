//! Nullable delivery: record OTPs instead of sending them.

use std::sync::Mutex;
use sv_types::{OtpCode, RollNo, Timestamp};
use sv_verification::OtpDelivery;

/// One recorded delivery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeliveredOtp {
    pub roll_no: RollNo,
    pub mobile_number: String,
    pub code: OtpCode,
    pub expires_at: Timestamp,
}

/// Records every delivery so tests can read the code a user would receive.
#[derive(Default)]
pub struct NullDelivery {
    sent: Mutex<Vec<DeliveredOtp>>,
}

impl NullDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// All deliveries so far, oldest first.
    pub fn sent(&self) -> Vec<DeliveredOtp> {
        self.sent.lock().unwrap().clone()
    }

    /// The code from the most recent delivery, as the user would type it.
    pub fn last_code(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|d| d.code.expose().to_owned())
    }
}

impl OtpDelivery for NullDelivery {
    fn deliver(&self, roll_no: &RollNo, mobile_number: &str, code: &OtpCode, expires_at: Timestamp) {
        self.sent.lock().unwrap().push(DeliveredOtp {
            roll_no: roll_no.clone(),
            mobile_number: mobile_number.to_owned(),
            code: code.clone(),
            expires_at,
        });
    }
}
