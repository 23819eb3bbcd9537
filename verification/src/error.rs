use sv_store::StoreError;
use sv_types::RollNo;
use thiserror::Error;

/// Failures of the verification operations.
///
/// Messages are safe to show to the caller: none of them ever contains an OTP
/// code.
#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("student {0} not found")]
    NotFound(RollNo),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("snapshot schema mismatch on field '{field}'")]
    SchemaMismatch { field: String },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("no valid OTP challenge for student {0}; request a new code")]
    NoValidChallenge(RollNo),

    #[error("submitted code does not match the current challenge")]
    CodeMismatch,

    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl VerificationError {
    /// Stable snake_case identifier for transports and clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::NoValidChallenge(_) => "no_valid_challenge",
            Self::CodeMismatch => "code_mismatch",
            Self::Persistence(_) => "persistence_error",
        }
    }

    /// Whether retrying (possibly after requesting a fresh code) can succeed
    /// without the caller changing its input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NoValidChallenge(_) | Self::CodeMismatch | Self::Persistence(_)
        )
    }
}
