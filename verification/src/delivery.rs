//! OTP delivery channel.
//!
//! SMS delivery is outside this system: the default channel writes the code to
//! the log under the `sv_otp_delivery` target so operators can relay it.

use sv_types::{OtpCode, RollNo, Timestamp};

pub trait OtpDelivery: Send + Sync {
    fn deliver(&self, roll_no: &RollNo, mobile_number: &str, code: &OtpCode, expires_at: Timestamp);
}

/// Logs the code instead of sending it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDelivery;

impl OtpDelivery for LogDelivery {
    fn deliver(&self, roll_no: &RollNo, mobile_number: &str, code: &OtpCode, expires_at: Timestamp) {
        tracing::info!(
            target: "sv_otp_delivery",
            roll_no = %roll_no,
            mobile_number = %mobile_number,
            code = %code.expose(),
            expires_at = expires_at.as_secs(),
            "OTP generated (delivery mocked, not sent)"
        );
    }
}
