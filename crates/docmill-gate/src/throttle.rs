//! Per-IP hourly request throttle.
//!
//! Applies to every caller regardless of tier, ahead of the quota check.
//! The window is a fixed UTC clock hour (all requests between 17:00 and
//! 18:00 share one bucket), not a sliding window.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Timelike, Utc};
use tracing::debug;

use docmill_cache::keys;
use docmill_core::config::gate::GateConfig;
use docmill_core::result::AppResult;
use docmill_core::traits::counter::CounterStore;

/// Bucket keys roll with the clock hour; expiry is hygiene only.
const EXPIRY_SLACK: Duration = Duration::from_secs(300);

/// Fixed-window request throttle keyed by client IP.
#[derive(Debug, Clone)]
pub struct IpThrottle {
    store: Arc<dyn CounterStore>,
    limit: i64,
}

impl IpThrottle {
    pub fn new(store: Arc<dyn CounterStore>, config: &GateConfig) -> Self {
        Self {
            store,
            limit: config.ip_hourly_limit,
        }
    }

    /// Record one request from `ip` and report whether it is admitted.
    ///
    /// Same atomicity rule as the usage gate: concurrent calls against K
    /// remaining slots admit exactly K.
    pub async fn check(&self, ip: IpAddr) -> AppResult<bool> {
        let now = Utc::now();
        let key = keys::ip_throttle(&ip.to_string(), now);
        let ttl = Duration::from_secs(secs_to_hour_end(now)) + EXPIRY_SLACK;

        let count = self.store.incr(&key, ttl).await?;
        let admitted = count <= self.limit;
        if !admitted {
            debug!(%ip, count, limit = self.limit, "IP throttled");
        }
        Ok(admitted)
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }
}

fn secs_to_hour_end(now: DateTime<Utc>) -> u64 {
    let into_hour = u64::from(now.minute()) * 60 + u64::from(now.second());
    3600 - into_hour
}
