use super::{Result, SessionCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory cache for single-node deployments and tests.
///
/// Expiry is enforced lazily on read; `cleanup_expired` sweeps entries whose
/// deadline has passed and is intended to be called periodically.
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Drop entries whose deadline has passed.
    pub fn cleanup_expired(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionCache for MemoryCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let cache = MemoryCache::new();

        cache
            .put("k1", "v1", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), Some("v1".to_string()));

        cache.delete("k1").await.unwrap();
        assert_eq!(cache.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = MemoryCache::new();

        cache
            .put("k1", "old", Duration::from_secs(60))
            .await
            .unwrap();
        cache
            .put("k1", "new", Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(cache.get("k1").await.unwrap(), Some("new".to_string()));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let cache = MemoryCache::new();

        cache
            .put("k1", "v1", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert_eq!(cache.get("k1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let cache = MemoryCache::new();

        cache
            .put("short", "v", Duration::from_millis(20))
            .await
            .unwrap();
        cache
            .put("long", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.len(), 2);

        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.cleanup_expired();

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long").await.unwrap(), Some("v".to_string()));
    }
}
