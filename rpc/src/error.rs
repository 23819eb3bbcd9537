//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sv_types::TypesError;
use sv_verification::VerificationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error(transparent)]
    InvalidRollNo(#[from] TypesError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl RpcError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RpcError::Verification(e) => match e {
                VerificationError::NotFound(_) => StatusCode::NOT_FOUND,
                VerificationError::InvalidInput(_)
                | VerificationError::PreconditionFailed(_)
                | VerificationError::NoValidChallenge(_)
                | VerificationError::CodeMismatch => StatusCode::BAD_REQUEST,
                VerificationError::SchemaMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                VerificationError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            RpcError::InvalidRollNo(_) | RpcError::InvalidBody(_) | RpcError::InvalidQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            RpcError::Internal(_) | RpcError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable, machine-readable error code. Clients match on this, never on
    /// the message.
    pub fn code(&self) -> &'static str {
        match self {
            RpcError::Verification(e) => e.kind(),
            RpcError::InvalidRollNo(_) | RpcError::InvalidBody(_) | RpcError::InvalidQuery(_) => {
                "invalid_input"
            }
            RpcError::Internal(_) | RpcError::Server(_) => "internal_error",
        }
    }

    /// Message shown to the client. Internal and storage details stay in the
    /// logs.
    fn public_message(&self) -> String {
        match self {
            RpcError::Verification(VerificationError::SchemaMismatch { .. })
            | RpcError::Internal(_)
            | RpcError::Server(_) => "internal error".to_owned(),
            RpcError::Verification(VerificationError::Persistence(_)) => {
                "storage unavailable, please retry".to_owned()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request failed");
        }
        let body = serde_json::json!({
            "error": self.public_message(),
            "code": self.code(),
        });
        (status, Json(body)).into_response()
    }
}
