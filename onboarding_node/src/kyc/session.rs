use crate::vendor::OtpChallenge;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Checks that keep transient correlation state between round trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckType {
    AadhaarOtp,
    BankLinkage,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::AadhaarOtp => "aadhaar_otp",
            CheckType::BankLinkage => "bank_linkage",
        }
    }
}

/// One in-flight verification attempt, serialized as JSON into the session
/// cache. At most one live session exists per `(check, user)`: issuing a new
/// challenge overwrites the previous session wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationSession {
    pub user_id: String,
    /// Original input, kept so a resend can re-open the same check.
    pub aadhaar_number: String,
    pub challenge: OtpChallenge,
    pub issued_at: u64,
}

impl CorrelationSession {
    pub fn new(user_id: &str, aadhaar_number: &str, challenge: OtpChallenge) -> Self {
        let issued_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            user_id: user_id.to_string(),
            aadhaar_number: aadhaar_number.to_string(),
            challenge,
            issued_at,
        }
    }

    pub fn cache_key(check: CheckType, user_id: &str) -> String {
        format!("kyc:session:{}:{}", check.as_str(), user_id)
    }
}
