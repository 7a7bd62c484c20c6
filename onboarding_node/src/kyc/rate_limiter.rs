use crate::cache::{CacheError, SessionCache};
use std::sync::Arc;
use std::time::Duration;

/// Fixed-cooldown guard over challenge issuance.
///
/// Implemented as set-if-absent with TTL against the session cache: a live
/// marker denies the operation, setting one opens the next window. There is
/// no queue and no backoff schedule — a denied caller waits out the window
/// and retries. The check and the set are two cache round trips, so two
/// callers racing one window can both pass; the session's last-write-wins
/// semantics already tolerate that.
pub struct CooldownLimiter {
    cache: Arc<dyn SessionCache>,
    cooldown: Duration,
}

impl CooldownLimiter {
    pub fn new(cache: Arc<dyn SessionCache>, cooldown: Duration) -> Self {
        Self { cache, cooldown }
    }

    /// True when the operation may proceed; the cooldown marker is set as a
    /// side effect, so a `true` result consumes the window even if the
    /// operation itself later fails.
    pub async fn try_acquire(&self, operation: &str, user_id: &str) -> Result<bool, CacheError> {
        let key = Self::marker_key(operation, user_id);

        if self.cache.get(&key).await?.is_some() {
            return Ok(false);
        }

        self.cache.put(&key, "1", self.cooldown).await?;
        Ok(true)
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn marker_key(operation: &str, user_id: &str) -> String {
        format!("kyc:cooldown:{}:{}", operation, user_id)
    }
}
