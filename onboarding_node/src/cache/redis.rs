use super::{CacheError, Result, SessionCache};
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use std::time::Duration;

/// Redis-backed cache for multi-node deployments.
///
/// TTL enforcement is delegated to the server (`SET ... EX`), so a sweep task
/// is unnecessary. The connection manager reconnects on its own; a request
/// that still cannot reach the server surfaces as `CacheError::Unreachable`.
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client =
            Client::open(redis_url).map_err(|e| CacheError::Unreachable(e.to_string()))?;
        let connection = client
            .get_connection_manager_with_config(config)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl SessionCache for RedisCache {
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut connection = self.connection.clone();
        let seconds = ttl.as_secs().max(1);
        let _: () = connection
            .set_ex(key, value, seconds)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        connection
            .get(key)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: () = connection
            .del(key)
            .await
            .map_err(|e| CacheError::Unreachable(e.to_string()))?;
        Ok(())
    }
}
