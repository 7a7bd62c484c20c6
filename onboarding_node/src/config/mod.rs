//! Runtime configuration.
//!
//! Built once at process start from environment variables and injected into
//! every component that needs it; nothing reads the environment after
//! startup and there is no module-level mutable state.

use crate::kyc::KycConfig;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// Credentials and timing for the external verification provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-call timeout; there is no retry on top of it.
    pub timeout_secs: u64,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://verify.invest-partner.example".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When set, sessions live in Redis; otherwise in process memory.
    pub redis_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub vendor: VendorConfig,
    pub cache: CacheConfig,
    pub kyc: KycConfig,
    pub api: ApiConfig,
}

impl Config {
    /// Build the configuration from `ONBOARDING_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            vendor: VendorConfig {
                base_url: env_or("ONBOARDING_VENDOR_URL", defaults.vendor.base_url),
                api_key: env_or("ONBOARDING_VENDOR_API_KEY", defaults.vendor.api_key),
                timeout_secs: env_parse(
                    "ONBOARDING_VENDOR_TIMEOUT_SECS",
                    defaults.vendor.timeout_secs,
                ),
            },
            cache: CacheConfig {
                redis_url: env::var("ONBOARDING_REDIS_URL").ok(),
            },
            kyc: KycConfig {
                session_ttl_secs: env_parse(
                    "ONBOARDING_SESSION_TTL_SECS",
                    defaults.kyc.session_ttl_secs,
                ),
                issue_cooldown_secs: env_parse(
                    "ONBOARDING_ISSUE_COOLDOWN_SECS",
                    defaults.kyc.issue_cooldown_secs,
                ),
            },
            api: ApiConfig {
                port: env_parse("ONBOARDING_PORT", defaults.api.port),
            },
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("invalid {key} value: {e}; using default");
            default
        }),
        Err(_) => default,
    }
}
