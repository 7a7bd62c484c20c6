//! Multi-stage identity-verification workflow.
//!
//! Orchestrates the Aadhaar OTP challenge, the single-shot PAN check, and the
//! bank-account linkage check. Transient per-attempt state lives in the
//! session cache under a fixed TTL; verified attributes land in the identity
//! record store. The two are deliberately not transactional — the record is
//! the source of truth and the cache tolerates staleness by expiring.

mod rate_limiter;
mod session;
mod workflow;

pub use self::rate_limiter::CooldownLimiter;
pub use self::session::{CheckType, CorrelationSession};
pub use self::workflow::{
    ChallengeReceipt, KycConfig, KycWorkflow, LinkageOutcome, PanOutcome, SubmitOutcome,
};

use crate::identity::RecordError;
use crate::vendor::VendorError;

pub type Result<T> = std::result::Result<T, KycError>;

/// Closed error taxonomy surfaced by every workflow operation. Callers get a
/// stable kind plus human-readable detail; the only vendor payload relayed
/// verbatim is the reason text on `VendorRejected`.
#[derive(Debug, thiserror::Error)]
pub enum KycError {
    #[error("verification provider unavailable: {0}")]
    VendorUnavailable(String),

    #[error("verification provider rejected the request: {0}")]
    VendorRejected(String),

    /// Recoverable: the caller must restart the check from issuance.
    #[error("verification session expired; request a new code")]
    ChallengeExpired,

    /// Recoverable: the caller may resubmit within the session lifetime.
    #[error("incorrect verification code")]
    ChallengeIncorrect,

    #[error("too many attempts; retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("no verification in progress for this user")]
    NoActiveSession,

    /// Workflow-ordering error on the caller's side.
    #[error("prerequisite verification step missing: {0}")]
    PrerequisiteMissing(&'static str),

    #[error("no identity record for this user")]
    NotFound,

    /// A state-store write failed. Reads fail closed into
    /// `ChallengeExpired`/`NoActiveSession` instead of surfacing this.
    #[error("verification state store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<VendorError> for KycError {
    fn from(err: VendorError) -> Self {
        match err {
            VendorError::Unavailable(detail) => KycError::VendorUnavailable(detail),
            VendorError::Rejected(reason) => KycError::VendorRejected(reason),
            VendorError::ChallengeExpired => KycError::ChallengeExpired,
            VendorError::ChallengeIncorrect => KycError::ChallengeIncorrect,
        }
    }
}

impl From<RecordError> for KycError {
    fn from(err: RecordError) -> Self {
        KycError::StoreUnavailable(err.to_string())
    }
}
