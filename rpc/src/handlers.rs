//! Request handlers and their request/response bodies.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};

use sv_store::RecordStore;
use sv_types::{
    ChangeLogEntry, DetailsPatch, RollNo, StudentDetails, StudentRecord, VerificationStatus,
};
use sv_verification::{OtpReceipt, VerificationError, VerificationService};

use crate::error::RpcError;
use crate::pagination::{PaginationMeta, PaginationParams};
use crate::server::SharedService;

// ── Student ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct StudentResponse {
    pub roll_no: RollNo,
    #[serde(flatten)]
    pub details: StudentDetails,
    pub is_mobile_verified: bool,
    pub is_data_verified: bool,
    pub status: VerificationStatus,
    pub created_at: u64,
    pub updated_at: u64,
}

impl From<StudentRecord> for StudentResponse {
    fn from(record: StudentRecord) -> Self {
        let status = record.status();
        Self {
            roll_no: record.roll_no,
            details: record.details,
            is_mobile_verified: record.is_mobile_verified,
            is_data_verified: record.is_data_verified,
            status,
            created_at: record.created_at.as_secs(),
            updated_at: record.updated_at.as_secs(),
        }
    }
}

// ── OTP ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    pub mobile_number: String,
}

#[derive(Debug, Serialize)]
pub struct RequestOtpResponse {
    pub challenge_id: u64,
    pub target_mobile_number: String,
    pub expires_at: u64,
}

impl From<OtpReceipt> for RequestOtpResponse {
    fn from(receipt: OtpReceipt) -> Self {
        Self {
            challenge_id: receipt.challenge_id.0,
            target_mobile_number: receipt.target_mobile_number,
            expires_at: receipt.expires_at.as_secs(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyMobileRequest {
    pub otp: String,
}

// ── History ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ChangeResponse {
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub timestamp: u64,
}

impl From<ChangeLogEntry> for ChangeResponse {
    fn from(entry: ChangeLogEntry) -> Self {
        Self {
            field_name: entry.field_name,
            old_value: entry.old_value,
            new_value: entry.new_value,
            timestamp: entry.timestamp.as_secs(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub roll_no: RollNo,
    pub changes: Vec<ChangeResponse>,
    #[serde(flatten)]
    pub pagination: PaginationMeta,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn get_student<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
) -> Result<Json<StudentResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let record = blocking(service, move |s| s.get_student(&roll_no)).await?;
    Ok(Json(record.into()))
}

pub async fn submit_edit<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
    body: Result<Json<StudentDetails>, JsonRejection>,
) -> Result<Json<StudentResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let Json(details) = body.map_err(|e| RpcError::InvalidBody(e.body_text()))?;
    let record = blocking(service, move |s| s.submit_edit(&roll_no, details)).await?;
    Ok(Json(record.into()))
}

pub async fn submit_patch<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
    body: Result<Json<DetailsPatch>, JsonRejection>,
) -> Result<Json<StudentResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let Json(patch) = body.map_err(|e| RpcError::InvalidBody(e.body_text()))?;
    let record = blocking(service, move |s| s.submit_patch(&roll_no, &patch)).await?;
    Ok(Json(record.into()))
}

pub async fn verify_data<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
) -> Result<Json<StudentResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let record = blocking(service, move |s| s.request_data_verification(&roll_no)).await?;
    Ok(Json(record.into()))
}

pub async fn request_otp<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
    body: Result<Json<RequestOtpRequest>, JsonRejection>,
) -> Result<Json<RequestOtpResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let Json(req) = body.map_err(|e| RpcError::InvalidBody(e.body_text()))?;
    let receipt = blocking(service, move |s| s.issue_otp(&roll_no, &req.mobile_number)).await?;
    Ok(Json(receipt.into()))
}

pub async fn verify_mobile<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
    body: Result<Json<VerifyMobileRequest>, JsonRejection>,
) -> Result<Json<StudentResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let Json(req) = body.map_err(|e| RpcError::InvalidBody(e.body_text()))?;
    let record = blocking(service, move |s| s.validate_otp(&roll_no, &req.otp)).await?;
    Ok(Json(record.into()))
}

/// One page of the audit trail, newest first. `?offset=&count=` select the
/// page.
pub async fn history<S: RecordStore + 'static>(
    State(service): State<SharedService<S>>,
    Path(roll_no): Path<String>,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, RpcError> {
    let roll_no = RollNo::new(roll_no)?;
    let Query(params) = query.map_err(|e| RpcError::InvalidQuery(e.body_text()))?;
    let lookup = roll_no.clone();
    let changes = blocking(service, move |s| s.get_change_history(&lookup)).await?;
    let (page, pagination) = params.page(changes);
    Ok(Json(HistoryResponse {
        roll_no,
        changes: page.into_iter().map(ChangeResponse::from).collect(),
        pagination,
    }))
}

/// Prometheus text exposition of every registered metric.
pub async fn metrics(State(registry): State<Registry>) -> Result<impl IntoResponse, RpcError> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buf)
        .map_err(|e| RpcError::Internal(format!("metrics encoding failed: {e}")))?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_owned())], buf))
}

/// Run a service call on the blocking pool; store access may hit disk.
async fn blocking<S, T, F>(service: SharedService<S>, f: F) -> Result<T, RpcError>
where
    S: RecordStore + 'static,
    T: Send + 'static,
    F: FnOnce(&VerificationService<S>) -> Result<T, VerificationError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| RpcError::Internal(format!("blocking task failed: {e}")))?
        .map_err(RpcError::from)
}
