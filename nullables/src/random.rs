//! Nullable code source: deterministic OTP codes.

use std::sync::Mutex;
use sv_types::OtpCode;
use sv_verification::CodeSource;

/// Returns pre-configured codes in order, cycling when exhausted.
pub struct NullCodeSource {
    codes: Vec<OtpCode>,
    index: Mutex<usize>,
}

impl NullCodeSource {
    /// Create with a sequence of codes.
    ///
    /// # Panics
    /// Panics if `codes` is empty or any entry is not six digits.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let codes: Vec<OtpCode> = codes
            .into_iter()
            .map(|c| OtpCode::new(c).expect("test codes must be six digits"))
            .collect();
        assert!(!codes.is_empty(), "NullCodeSource needs at least one code");
        Self {
            codes,
            index: Mutex::new(0),
        }
    }

    /// Create with a single code returned for every call.
    pub fn constant(code: &str) -> Self {
        Self::new([code])
    }
}

impl CodeSource for NullCodeSource {
    fn next_code(&self) -> OtpCode {
        let mut idx = self.index.lock().unwrap();
        let code = self.codes[*idx % self.codes.len()].clone();
        *idx += 1;
        code
    }
}
