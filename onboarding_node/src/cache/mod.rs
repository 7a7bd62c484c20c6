//! Transient session cache.
//!
//! Holds in-flight verification state (OTP correlation identifiers, cooldown
//! markers) as string-encoded payloads under string keys. Every entry carries
//! a TTL and expiry is the only invalidation signal; no "expired" flag is
//! ever stored. Operations are single-key round trips with no cross-key
//! transaction.

mod memory;
mod redis;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

use async_trait::async_trait;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache backend unreachable: {0}")]
    Unreachable(String),
}

/// Key-value store with per-key expiration.
///
/// `put` overwrites unconditionally: there is no compare-and-swap, so two
/// writers racing on one key resolve by last write wins. Callers that cannot
/// reach the backend must treat the failure as "no entry found" rather than
/// assume the write or read happened.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Store `value` under `key`, replacing any existing entry and its
    /// deadline. The entry expires after `ttl`.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Fetch the live value for `key`. Expired and missing entries are both
    /// reported as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Drop the entry for `key`, if any.
    async fn delete(&self, key: &str) -> Result<()>;
}
