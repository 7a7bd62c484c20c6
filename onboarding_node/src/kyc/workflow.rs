use super::{CheckType, CooldownLimiter, CorrelationSession, KycError, Result};
use crate::cache::{CacheError, SessionCache};
use crate::identity::{IdentityRecord, RecordStore, VerificationStatus};
use crate::vendor::{IdentityAttributes, VerificationProvider};
use log::warn;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Cooldown bucket for OTP issuance and resend; both consume one window.
const OP_AADHAAR_ISSUE: &str = "aadhaar_otp";
const OP_PAN_VERIFY: &str = "pan_verify";

/// Timing knobs for the verification workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KycConfig {
    /// Lifetime of an unconfirmed OTP session.
    pub session_ttl_secs: u64,
    /// Minimum gap between challenge issuances for one user.
    pub issue_cooldown_secs: u64,
}

impl Default for KycConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 300,
            issue_cooldown_secs: 60,
        }
    }
}

/// Receipt for an issued or re-issued challenge.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeReceipt {
    pub correlation_ref: String,
    pub message: String,
}

/// Outcome of a confirmed OTP submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub attributes: IdentityAttributes,
    pub record_updated: bool,
}

/// Outcome of a single-shot PAN check.
#[derive(Debug, Clone, Serialize)]
pub struct PanOutcome {
    pub registered_name: String,
}

/// Outcome of a bank-linkage check.
#[derive(Debug, Clone, Serialize)]
pub struct LinkageOutcome {
    pub linked: bool,
    pub confidence: f64,
    pub status: VerificationStatus,
}

/// Orchestrates the verification sequence for one deployment.
///
/// Per `(user, Aadhaar-OTP)` the states are NoSession -> ChallengeIssued ->
/// confirmed; an incorrect code keeps the session, an expired one drops it,
/// and a resend overwrites it with fresh vendor identifiers. PAN and bank
/// linkage are single-shot. Record upserts and cache mutations are separate
/// round trips on purpose: the record is the source of truth, and a stale
/// session resolves itself by TTL or surfaces as `ChallengeExpired`.
pub struct KycWorkflow {
    cache: Arc<dyn SessionCache>,
    records: Arc<dyn RecordStore>,
    provider: Arc<dyn VerificationProvider>,
    limiter: CooldownLimiter,
    session_ttl: Duration,
}

impl KycWorkflow {
    pub fn new(
        cache: Arc<dyn SessionCache>,
        records: Arc<dyn RecordStore>,
        provider: Arc<dyn VerificationProvider>,
        session_ttl: Duration,
        issue_cooldown: Duration,
    ) -> Self {
        Self {
            limiter: CooldownLimiter::new(cache.clone(), issue_cooldown),
            cache,
            records,
            provider,
            session_ttl,
        }
    }

    /// Open an Aadhaar OTP challenge for `user_id`.
    ///
    /// Consults the cooldown first, then asks the provider to send a code and
    /// stores the correlation session under the fixed TTL. Any previous
    /// session for the user is overwritten.
    pub async fn initiate_aadhaar(
        &self,
        user_id: &str,
        aadhaar_number: &str,
    ) -> Result<ChallengeReceipt> {
        self.acquire_window(OP_AADHAAR_ISSUE, user_id).await?;

        let challenge = self.provider.issue_aadhaar_otp(aadhaar_number).await?;
        let session = CorrelationSession::new(user_id, aadhaar_number, challenge);
        self.store_session(&session).await?;

        Ok(ChallengeReceipt {
            correlation_ref: session.challenge.transaction_id,
            message: "verification code sent to the registered mobile number".to_string(),
        })
    }

    /// Re-issue the OTP for an already-open challenge. Requires a live
    /// session; the stored session is overwritten with the fresh vendor
    /// identifiers, and the cooldown window restarts.
    pub async fn resend_aadhaar_otp(
        &self,
        user_id: &str,
        aadhaar_number: &str,
    ) -> Result<ChallengeReceipt> {
        if self.load_session(user_id).await.is_none() {
            return Err(KycError::NoActiveSession);
        }

        self.acquire_window(OP_AADHAAR_ISSUE, user_id).await?;

        let challenge = self.provider.issue_aadhaar_otp(aadhaar_number).await?;
        let session = CorrelationSession::new(user_id, aadhaar_number, challenge);
        self.store_session(&session).await?;

        Ok(ChallengeReceipt {
            correlation_ref: session.challenge.transaction_id,
            message: "verification code re-sent".to_string(),
        })
    }

    /// Confirm the open challenge with the code the user received.
    ///
    /// On success the identity record picks up the returned attributes and
    /// the session is cleared (best effort). An incorrect code leaves the
    /// session usable for another attempt; an expired transaction drops it.
    pub async fn submit_aadhaar_otp(&self, user_id: &str, code: &str) -> Result<SubmitOutcome> {
        let session = self
            .load_session(user_id)
            .await
            .ok_or(KycError::ChallengeExpired)?;

        let attributes = match self
            .provider
            .submit_aadhaar_otp(&session.challenge, code)
            .await
        {
            Ok(attributes) => attributes,
            Err(err) => {
                let mapped = KycError::from(err);
                if matches!(mapped, KycError::ChallengeExpired) {
                    self.drop_session(user_id).await;
                }
                return Err(mapped);
            }
        };

        let mut record = self
            .records
            .get(user_id)
            .await?
            .unwrap_or_else(|| IdentityRecord::new(user_id));
        record.aadhaar_number = Some(attributes.masked_aadhaar.clone());
        record.touch();
        self.records.upsert(record).await?;

        self.drop_session(user_id).await;

        Ok(SubmitOutcome {
            attributes,
            record_updated: true,
        })
    }

    /// Single-shot PAN lookup; populates the record's PAN on success.
    pub async fn verify_pan(&self, user_id: &str, pan_number: &str) -> Result<PanOutcome> {
        self.acquire_window(OP_PAN_VERIFY, user_id).await?;

        let pan = self.provider.verify_pan(pan_number).await?;

        let mut record = self
            .records
            .get(user_id)
            .await?
            .unwrap_or_else(|| IdentityRecord::new(user_id));
        record.pan_number = Some(pan_number.to_uppercase());
        record.touch();
        self.records.upsert(record).await?;

        Ok(PanOutcome {
            registered_name: pan.registered_name,
        })
    }

    /// Check that the named bank account belongs to the record's PAN holder.
    ///
    /// Requires a previously verified PAN. A vendor-confirmed linkage moves
    /// the record to `Verified`; an affirmative mismatch moves it to
    /// `Rejected`. Either way the account coordinates are recorded.
    pub async fn check_bank_linkage(
        &self,
        user_id: &str,
        account_number: &str,
        ifsc: &str,
    ) -> Result<LinkageOutcome> {
        let mut record = self.records.get(user_id).await?.ok_or(
            KycError::PrerequisiteMissing("PAN verification must complete first"),
        )?;
        let pan_number = record
            .pan_number
            .clone()
            .ok_or(KycError::PrerequisiteMissing(
                "PAN verification must complete first",
            ))?;

        let result = self
            .provider
            .check_bank_linkage(&pan_number, account_number, ifsc)
            .await?;

        record.bank_account_number = Some(account_number.to_string());
        record.bank_ifsc = Some(ifsc.to_string());
        record.linkage_confirmed = result.linked;
        record.status = if result.linked {
            VerificationStatus::Verified
        } else {
            VerificationStatus::Rejected
        };
        record.touch();
        self.records.upsert(record.clone()).await?;

        Ok(LinkageOutcome {
            linked: result.linked,
            confidence: result.match_confidence,
            status: record.status,
        })
    }

    /// Read-only record fetch for dashboards; no side effects.
    pub async fn status(&self, user_id: &str) -> Result<IdentityRecord> {
        self.records.get(user_id).await?.ok_or(KycError::NotFound)
    }

    async fn acquire_window(&self, operation: &str, user_id: &str) -> Result<()> {
        let allowed = self
            .limiter
            .try_acquire(operation, user_id)
            .await
            .map_err(store_unavailable)?;

        if !allowed {
            return Err(KycError::RateLimited {
                retry_after_secs: self.limiter.cooldown().as_secs(),
            });
        }
        Ok(())
    }

    async fn store_session(&self, session: &CorrelationSession) -> Result<()> {
        let key = CorrelationSession::cache_key(CheckType::AadhaarOtp, &session.user_id);
        let payload =
            serde_json::to_string(session).map_err(|e| KycError::StoreUnavailable(e.to_string()))?;
        self.cache
            .put(&key, &payload, self.session_ttl)
            .await
            .map_err(store_unavailable)
    }

    /// Fails closed: an unreachable cache and a missing session are
    /// indistinguishable, so both read as "no session". Undecodable payloads
    /// count as stale and read the same way.
    async fn load_session(&self, user_id: &str) -> Option<CorrelationSession> {
        let key = CorrelationSession::cache_key(CheckType::AadhaarOtp, user_id);
        let raw = match self.cache.get(&key).await {
            Ok(found) => found?,
            Err(err) => {
                warn!("session lookup failed for {user_id}: {err}; treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!("discarding undecodable session for {user_id}: {err}");
                None
            }
        }
    }

    /// Best-effort cleanup; the record mutation preceding it is the source
    /// of truth, so a failed delete is logged and not escalated.
    async fn drop_session(&self, user_id: &str) {
        let key = CorrelationSession::cache_key(CheckType::AadhaarOtp, user_id);
        if let Err(err) = self.cache.delete(&key).await {
            warn!("failed to clear verification session for {user_id}: {err}");
        }
    }
}

fn store_unavailable(err: CacheError) -> KycError {
    KycError::StoreUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::identity::MemoryRecordStore;
    use crate::vendor::{
        IdentityAttributes, LinkageResult, OtpChallenge, PanRecord, VendorError,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const GOOD_OTP: &str = "111111";

    /// Scripted provider: issues numbered transactions, accepts one code,
    /// rejects PANs starting with "X", and links every account except
    /// "ACC-UNLINKED".
    struct ScriptedProvider {
        issued: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            Self {
                issued: AtomicUsize::new(0),
            }
        }

        fn issue_count(&self) -> usize {
            self.issued.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VerificationProvider for ScriptedProvider {
        async fn issue_aadhaar_otp(
            &self,
            _aadhaar_number: &str,
        ) -> crate::vendor::Result<OtpChallenge> {
            let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(OtpChallenge {
                transaction_id: format!("tx-{}", n),
                forward_pointer: format!("fwd-{}", n),
                verifier_token: format!("ver-{}", n),
            })
        }

        async fn submit_aadhaar_otp(
            &self,
            _challenge: &OtpChallenge,
            code: &str,
        ) -> crate::vendor::Result<IdentityAttributes> {
            if code != GOOD_OTP {
                return Err(VendorError::ChallengeIncorrect);
            }
            Ok(IdentityAttributes {
                full_name: "Asha Sharma".to_string(),
                date_of_birth: "1990-01-01".to_string(),
                address: "Pune, MH".to_string(),
                masked_aadhaar: "XXXX-XXXX-9012".to_string(),
            })
        }

        async fn verify_pan(&self, pan_number: &str) -> crate::vendor::Result<PanRecord> {
            if pan_number.starts_with('X') {
                return Err(VendorError::Rejected("PAN not found or inactive".into()));
            }
            Ok(PanRecord {
                registered_name: "ASHA SHARMA".to_string(),
                category: Some("Individual".to_string()),
            })
        }

        async fn check_bank_linkage(
            &self,
            _pan_number: &str,
            account_number: &str,
            _ifsc: &str,
        ) -> crate::vendor::Result<LinkageResult> {
            Ok(LinkageResult {
                linked: account_number != "ACC-UNLINKED",
                match_confidence: 0.94,
            })
        }
    }

    fn workflow_with(
        provider: Arc<ScriptedProvider>,
        session_ttl: Duration,
        cooldown: Duration,
    ) -> (KycWorkflow, Arc<MemoryRecordStore>) {
        let records = Arc::new(MemoryRecordStore::new());
        let workflow = KycWorkflow::new(
            Arc::new(MemoryCache::new()),
            records.clone(),
            provider,
            session_ttl,
            cooldown,
        );
        (workflow, records)
    }

    fn quick_workflow() -> (KycWorkflow, Arc<MemoryRecordStore>, Arc<ScriptedProvider>) {
        let provider = Arc::new(ScriptedProvider::new());
        let (workflow, records) = workflow_with(
            provider.clone(),
            Duration::from_secs(300),
            Duration::from_millis(50),
        );
        (workflow, records, provider)
    }

    #[tokio::test]
    async fn test_submit_without_initiate_is_expired() {
        let (workflow, _, _) = quick_workflow();

        let err = workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap_err();
        assert!(matches!(err, KycError::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_initiate_within_cooldown_is_rate_limited() {
        let provider = Arc::new(ScriptedProvider::new());
        let (workflow, _) = workflow_with(
            provider.clone(),
            Duration::from_secs(300),
            Duration::from_secs(60),
        );

        workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();
        let err = workflow
            .initiate_aadhaar("u1", "123456789012")
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::RateLimited { .. }));
        assert_eq!(provider.issue_count(), 1);
    }

    #[tokio::test]
    async fn test_initiate_after_cooldown_overwrites_session() {
        let (workflow, _, provider) = quick_workflow();

        let first = workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();
        assert_eq!(first.correlation_ref, "tx-1");

        tokio::time::sleep(Duration::from_millis(80)).await;
        let second = workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();
        assert_eq!(second.correlation_ref, "tx-2");
        assert_eq!(provider.issue_count(), 2);

        // confirming now runs against the second transaction
        let outcome = workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap();
        assert!(outcome.record_updated);
    }

    #[tokio::test]
    async fn test_wrong_code_keeps_session_right_code_confirms() {
        let (workflow, records, _) = quick_workflow();

        workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();

        let err = workflow.submit_aadhaar_otp("u1", "000000").await.unwrap_err();
        assert!(matches!(err, KycError::ChallengeIncorrect));

        let outcome = workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap();
        assert_eq!(outcome.attributes.masked_aadhaar, "XXXX-XXXX-9012");

        let record = records.get("u1").await.unwrap().unwrap();
        assert_eq!(record.aadhaar_number.as_deref(), Some("XXXX-XXXX-9012"));
        assert_eq!(record.status, VerificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_submit_after_ttl_expiry_is_expired() {
        let provider = Arc::new(ScriptedProvider::new());
        let (workflow, _) = workflow_with(
            provider,
            Duration::from_millis(40),
            Duration::from_millis(10),
        );

        workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();
        tokio::time::sleep(Duration::from_millis(70)).await;

        let err = workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap_err();
        assert!(matches!(err, KycError::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_session_cleared_after_confirmation() {
        let (workflow, _, _) = quick_workflow();

        workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();
        workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap();

        let err = workflow.submit_aadhaar_otp("u1", GOOD_OTP).await.unwrap_err();
        assert!(matches!(err, KycError::ChallengeExpired));
    }

    #[tokio::test]
    async fn test_resend_requires_active_session() {
        let (workflow, _, _) = quick_workflow();

        let err = workflow
            .resend_aadhaar_otp("u1", "123456789012")
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_resend_is_rate_limited_then_reissues() {
        let (workflow, _, provider) = quick_workflow();

        workflow.initiate_aadhaar("u1", "123456789012").await.unwrap();

        // still inside the issuance window
        let err = workflow
            .resend_aadhaar_otp("u1", "123456789012")
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::RateLimited { .. }));

        tokio::time::sleep(Duration::from_millis(80)).await;
        let receipt = workflow
            .resend_aadhaar_otp("u1", "123456789012")
            .await
            .unwrap();
        assert_eq!(receipt.correlation_ref, "tx-2");
        assert_eq!(provider.issue_count(), 2);
    }

    #[tokio::test]
    async fn test_linkage_before_pan_is_prerequisite_missing() {
        let (workflow, _, _) = quick_workflow();

        let err = workflow
            .check_bank_linkage("u1", "ACC123", "IFSC001")
            .await
            .unwrap_err();
        assert!(matches!(err, KycError::PrerequisiteMissing(_)));
    }

    #[tokio::test]
    async fn test_confirmed_linkage_verifies_record() {
        let (workflow, records, _) = quick_workflow();

        workflow.verify_pan("u1", "abcpd1234e").await.unwrap();
        let outcome = workflow
            .check_bank_linkage("u1", "ACC123", "IFSC001")
            .await
            .unwrap();
        assert!(outcome.linked);
        assert_eq!(outcome.status, VerificationStatus::Verified);

        let record = records.get("u1").await.unwrap().unwrap();
        assert_eq!(record.status, VerificationStatus::Verified);
        assert!(record.linkage_confirmed);
        assert_eq!(record.pan_number.as_deref(), Some("ABCPD1234E"));
        assert_eq!(record.bank_ifsc.as_deref(), Some("IFSC001"));
    }

    #[tokio::test]
    async fn test_unlinked_account_rejects_record() {
        let (workflow, records, _) = quick_workflow();

        workflow.verify_pan("u1", "ABCPD1234E").await.unwrap();
        let outcome = workflow
            .check_bank_linkage("u1", "ACC-UNLINKED", "IFSC001")
            .await
            .unwrap();
        assert!(!outcome.linked);
        assert_eq!(outcome.status, VerificationStatus::Rejected);

        let record = records.get("u1").await.unwrap().unwrap();
        assert_eq!(record.status, VerificationStatus::Rejected);
        assert!(!record.linkage_confirmed);
    }

    #[tokio::test]
    async fn test_invalid_pan_is_vendor_rejected() {
        let (workflow, records, _) = quick_workflow();

        let err = workflow.verify_pan("u1", "XXXXX0000X").await.unwrap_err();
        assert!(matches!(err, KycError::VendorRejected(_)));
        assert!(records.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_status_read_back() {
        let (workflow, _, _) = quick_workflow();

        let err = workflow.status("u1").await.unwrap_err();
        assert!(matches!(err, KycError::NotFound));

        workflow.verify_pan("u1", "ABCPD1234E").await.unwrap();
        workflow
            .check_bank_linkage("u1", "ACC123", "IFSC001")
            .await
            .unwrap();

        let record = workflow.status("u1").await.unwrap();
        assert_eq!(record.status, VerificationStatus::Verified);

        // a later read never regresses the status
        let record = workflow.status("u1").await.unwrap();
        assert_eq!(record.status, VerificationStatus::Verified);
    }
}
