//! Usage gate and rate-limit configuration.

use serde::{Deserialize, Serialize};

/// Usage gate configuration.
///
/// Daily quotas are counted per identity against a counter store selected
/// by `provider`. The IP throttle applies to all callers regardless of
/// tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Counter store backend: `"memory"` or `"redis"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Daily conversion quota for anonymous callers.
    #[serde(default = "default_anonymous_daily")]
    pub anonymous_daily_limit: i64,
    /// Daily conversion quota for free-tier accounts.
    #[serde(default = "default_free_daily")]
    pub free_daily_limit: i64,
    /// Daily conversion quota for premium accounts.
    #[serde(default = "default_premium_daily")]
    pub premium_daily_limit: i64,
    /// Requests admitted per IP per hour.
    #[serde(default = "default_ip_hourly")]
    pub ip_hourly_limit: i64,
    /// Maximum input file size in bytes for anonymous and free callers.
    #[serde(default = "default_max_file_free")]
    pub max_file_size_free: u64,
    /// Maximum input file size in bytes for premium callers.
    #[serde(default = "default_max_file_premium")]
    pub max_file_size_premium: u64,
    /// Redis counter store configuration.
    #[serde(default)]
    pub redis: RedisGateConfig,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            anonymous_daily_limit: default_anonymous_daily(),
            free_daily_limit: default_free_daily(),
            premium_daily_limit: default_premium_daily(),
            ip_hourly_limit: default_ip_hourly(),
            max_file_size_free: default_max_file_free(),
            max_file_size_premium: default_max_file_premium(),
            redis: RedisGateConfig::default(),
        }
    }
}

/// Redis counter store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisGateConfig {
    /// Redis connection URL.
    #[serde(default = "default_redis_url")]
    pub url: String,
    /// Key prefix for all DocMill counter keys.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for RedisGateConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_provider() -> String {
    "memory".to_string()
}

fn default_anonymous_daily() -> i64 {
    5
}

fn default_free_daily() -> i64 {
    5
}

fn default_premium_daily() -> i64 {
    1000
}

fn default_ip_hourly() -> i64 {
    20
}

fn default_max_file_free() -> u64 {
    10_485_760 // 10 MB
}

fn default_max_file_premium() -> u64 {
    52_428_800 // 50 MB
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_key_prefix() -> String {
    "docmill:".to_string()
}
