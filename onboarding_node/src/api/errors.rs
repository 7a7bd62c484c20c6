//! Error rendering for the HTTP layer.
//!
//! Workflow errors carry a stable machine-readable kind plus the
//! human-readable detail from the error itself; handlers add a `BadRequest`
//! case for malformed input that never reaches the workflow.

use crate::kyc::KycError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    Kyc(KycError),
    BadRequest(String),
}

impl ApiError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        ApiError::BadRequest(detail.into())
    }
}

impl From<KycError> for ApiError {
    fn from(err: KycError) -> Self {
        ApiError::Kyc(err)
    }
}

/// JSON body returned on every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Kyc(err) => {
                let (status, kind) = match &err {
                    KycError::VendorUnavailable(_) => {
                        (StatusCode::BAD_GATEWAY, "VENDOR_UNAVAILABLE")
                    }
                    KycError::VendorRejected(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "VENDOR_REJECTED")
                    }
                    KycError::ChallengeExpired => (StatusCode::GONE, "CHALLENGE_EXPIRED"),
                    KycError::ChallengeIncorrect => {
                        (StatusCode::BAD_REQUEST, "CHALLENGE_INCORRECT")
                    }
                    KycError::RateLimited { .. } => {
                        (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
                    }
                    KycError::NoActiveSession => (StatusCode::CONFLICT, "NO_ACTIVE_SESSION"),
                    KycError::PrerequisiteMissing(_) => {
                        (StatusCode::CONFLICT, "PREREQUISITE_MISSING")
                    }
                    KycError::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                    KycError::StoreUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
                    }
                };
                (status, kind, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: kind, detail })).into_response()
    }
}
