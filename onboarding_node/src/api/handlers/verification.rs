use crate::api::errors::{ApiError, ApiResult};
use crate::api::AppState;
use crate::identity::{IdentityRecord, VerificationStatus};
use crate::kyc::{ChallengeReceipt, LinkageOutcome, PanOutcome, SubmitOutcome};
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct InitiateAadhaarRequest {
    pub user_id: String,
    pub aadhaar_number: String,
}

#[derive(Debug, Serialize)]
pub struct ChallengeResponse {
    pub correlation_ref: String,
    pub message: String,
}

impl From<ChallengeReceipt> for ChallengeResponse {
    fn from(receipt: ChallengeReceipt) -> Self {
        Self {
            correlation_ref: receipt.correlation_ref,
            message: receipt.message,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitAadhaarRequest {
    pub user_id: String,
    pub otp: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAadhaarResponse {
    pub full_name: String,
    pub date_of_birth: String,
    pub address: String,
    pub masked_aadhaar: String,
    pub record_updated: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPanRequest {
    pub user_id: String,
    pub pan_number: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyPanResponse {
    pub registered_name: String,
}

#[derive(Debug, Deserialize)]
pub struct BankLinkageRequest {
    pub user_id: String,
    pub account_number: String,
    pub ifsc: String,
}

#[derive(Debug, Serialize)]
pub struct BankLinkageResponse {
    pub linked: bool,
    pub confidence: f64,
    pub status: VerificationStatus,
}

pub async fn initiate_aadhaar(
    State(state): State<AppState>,
    Json(req): Json<InitiateAadhaarRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    validate_user_id(&req.user_id)?;
    validate_aadhaar(&req.aadhaar_number)?;

    let receipt = state
        .workflow
        .initiate_aadhaar(&req.user_id, &req.aadhaar_number)
        .await?;
    Ok(Json(receipt.into()))
}

pub async fn submit_aadhaar(
    State(state): State<AppState>,
    Json(req): Json<SubmitAadhaarRequest>,
) -> ApiResult<Json<SubmitAadhaarResponse>> {
    validate_user_id(&req.user_id)?;
    if req.otp.len() != 6 || !req.otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("otp must be a 6-digit code"));
    }

    let SubmitOutcome {
        attributes,
        record_updated,
    } = state.workflow.submit_aadhaar_otp(&req.user_id, &req.otp).await?;

    Ok(Json(SubmitAadhaarResponse {
        full_name: attributes.full_name,
        date_of_birth: attributes.date_of_birth,
        address: attributes.address,
        masked_aadhaar: attributes.masked_aadhaar,
        record_updated,
    }))
}

pub async fn resend_aadhaar(
    State(state): State<AppState>,
    Json(req): Json<InitiateAadhaarRequest>,
) -> ApiResult<Json<ChallengeResponse>> {
    validate_user_id(&req.user_id)?;
    validate_aadhaar(&req.aadhaar_number)?;

    let receipt = state
        .workflow
        .resend_aadhaar_otp(&req.user_id, &req.aadhaar_number)
        .await?;
    Ok(Json(receipt.into()))
}

pub async fn verify_pan(
    State(state): State<AppState>,
    Json(req): Json<VerifyPanRequest>,
) -> ApiResult<Json<VerifyPanResponse>> {
    validate_user_id(&req.user_id)?;
    validate_pan(&req.pan_number)?;

    let PanOutcome { registered_name } = state
        .workflow
        .verify_pan(&req.user_id, &req.pan_number)
        .await?;
    Ok(Json(VerifyPanResponse { registered_name }))
}

pub async fn check_bank_linkage(
    State(state): State<AppState>,
    Json(req): Json<BankLinkageRequest>,
) -> ApiResult<Json<BankLinkageResponse>> {
    validate_user_id(&req.user_id)?;
    if req.account_number.is_empty() || req.ifsc.len() != 11 {
        return Err(ApiError::bad_request(
            "account_number and an 11-character ifsc are required",
        ));
    }

    let LinkageOutcome {
        linked,
        confidence,
        status,
    } = state
        .workflow
        .check_bank_linkage(&req.user_id, &req.account_number, &req.ifsc)
        .await?;

    Ok(Json(BankLinkageResponse {
        linked,
        confidence,
        status,
    }))
}

pub async fn kyc_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<IdentityRecord>> {
    validate_user_id(&user_id)?;

    let record = state.workflow.status(&user_id).await?;
    Ok(Json(record))
}

fn validate_user_id(user_id: &str) -> ApiResult<()> {
    if user_id.is_empty() || user_id.len() > 64 {
        return Err(ApiError::bad_request("user_id must be 1-64 characters"));
    }
    Ok(())
}

fn validate_aadhaar(aadhaar_number: &str) -> ApiResult<()> {
    if aadhaar_number.len() != 12 || !aadhaar_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::bad_request("aadhaar_number must be 12 digits"));
    }
    Ok(())
}

fn validate_pan(pan_number: &str) -> ApiResult<()> {
    let bytes = pan_number.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[..5].iter().all(u8::is_ascii_alphabetic)
        && bytes[5..9].iter().all(u8::is_ascii_digit)
        && bytes[9].is_ascii_alphabetic();

    if !shaped {
        return Err(ApiError::bad_request(
            "pan_number must match the AAAAA9999A format",
        ));
    }
    Ok(())
}
