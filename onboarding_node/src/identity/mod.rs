//! Persistent identity records.
//!
//! One mutable aggregate per investor, keyed by `user_id`. Records are
//! created lazily on the first successful verification step and updated in
//! place afterwards; this subsystem never deletes them (removal is an
//! administrative operation elsewhere). The production relational store sits
//! behind [`RecordStore`]; the core only needs get-by-key and upsert.

mod store;

pub use self::store::MemoryRecordStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, RecordError>;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Verification progress for an investor.
///
/// `Verified` is reached only after both document checks and the bank-linkage
/// check succeed; `Rejected` records a vendor-reported linkage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub user_id: String,
    /// Masked form only; the full number is never persisted.
    pub aadhaar_number: Option<String>,
    pub pan_number: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub status: VerificationStatus,
    /// True only when the account-to-PAN linkage is vendor-confirmed.
    /// Invariant: `status == Verified` implies `linkage_confirmed` and a
    /// populated `pan_number`.
    pub linkage_confirmed: bool,
    pub updated_at: DateTime<Utc>,
}

impl IdentityRecord {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            aadhaar_number: None,
            pan_number: None,
            bank_account_number: None,
            bank_ifsc: None,
            status: VerificationStatus::Pending,
            linkage_confirmed: false,
            updated_at: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Get-by-key / upsert boundary over the record storage engine.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<IdentityRecord>>;

    /// Insert or replace the record for `record.user_id`. Idempotent; safe
    /// for a caller to repeat after a partial failure.
    async fn upsert(&self, record: IdentityRecord) -> Result<()>;
}
