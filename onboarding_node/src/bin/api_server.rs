use anyhow::Result;
use log::info;
use onboarding_node::api::server::{run, AppState};
use onboarding_node::cache::{MemoryCache, RedisCache, SessionCache};
use onboarding_node::config::Config;
use onboarding_node::identity::MemoryRecordStore;
use onboarding_node::kyc::KycWorkflow;
use onboarding_node::vendor::HttpVerificationClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env();

    let cache: Arc<dyn SessionCache> = match &config.cache.redis_url {
        Some(url) => {
            info!("session cache: redis");
            Arc::new(RedisCache::connect(url).await?)
        }
        None => {
            info!("session cache: in-process memory");
            let cache = Arc::new(MemoryCache::new());
            spawn_cache_sweeper(cache.clone());
            cache
        }
    };

    let records = Arc::new(MemoryRecordStore::new());
    let provider = Arc::new(HttpVerificationClient::new(&config.vendor));
    let workflow = Arc::new(KycWorkflow::new(
        cache,
        records,
        provider,
        Duration::from_secs(config.kyc.session_ttl_secs),
        Duration::from_secs(config.kyc.issue_cooldown_secs),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    run(addr, AppState { workflow }).await
}

/// The in-memory cache enforces TTLs lazily on read; sweep it once a minute
/// so abandoned sessions do not pile up.
fn spawn_cache_sweeper(cache: Arc<MemoryCache>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            cache.cleanup_expired();
        }
    });
}
