//! Daily usage quota enforcement.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use tracing::debug;

use docmill_cache::keys;
use docmill_core::config::gate::GateConfig;
use docmill_core::result::AppResult;
use docmill_core::traits::counter::CounterStore;
use docmill_entity::identity::Identity;
use docmill_entity::tier::Tier;
use docmill_entity::usage::UsageData;

/// Counter keys already roll over because they carry the UTC date; the
/// expiry only keeps dead keys from accumulating in the store.
const EXPIRY_SLACK: Duration = Duration::from_secs(3600);

/// Outcome of a quota admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Whether the conversion may proceed.
    pub allowed: bool,
    /// Conversions left in the current period after this one.
    pub remaining: i64,
    /// Rejection explanation; set only when `allowed` is false.
    pub message: Option<String>,
}

/// Enforces per-identity daily conversion quotas.
///
/// Admission is increment-then-compare on the shared counter store: each
/// check takes the next counter value atomically, so N concurrent requests
/// against K remaining slots admit exactly K. Quota exhaustion is a normal
/// outcome, reported through [`GateDecision::allowed`], never as an error.
#[derive(Debug, Clone)]
pub struct UsageGate {
    store: Arc<dyn CounterStore>,
    config: GateConfig,
}

impl UsageGate {
    pub fn new(store: Arc<dyn CounterStore>, config: GateConfig) -> Self {
        Self { store, config }
    }

    /// Claim one conversion slot for `identity`, or report exhaustion.
    pub async fn check_and_increment(
        &self,
        identity: &Identity,
        tier: Tier,
    ) -> AppResult<GateDecision> {
        let limit = tier.daily_limit(&self.config);
        let now = Utc::now();
        let key = keys::usage(&identity.key(), now.date_naive());

        let used = self.store.incr(&key, day_ttl(now)).await?;
        if used > limit {
            let reset = next_utc_midnight(now);
            debug!(identity = %identity, %tier, used, limit, "Daily quota exhausted");
            return Ok(GateDecision {
                allowed: false,
                remaining: 0,
                message: Some(quota_message(limit, reset)),
            });
        }

        Ok(GateDecision {
            allowed: true,
            remaining: limit - used,
            message: None,
        })
    }

    /// Read-only quota snapshot for `identity`. Does not consume a slot.
    pub async fn usage(&self, identity: &Identity, tier: Tier) -> AppResult<UsageData> {
        let limit = tier.daily_limit(&self.config);
        let now = Utc::now();
        let key = keys::usage(&identity.key(), now.date_naive());

        // Denied attempts still bump the raw counter, so clamp for display.
        let used = self.store.get(&key).await?.unwrap_or(0).min(limit);

        Ok(UsageData {
            conversions_used: used,
            conversions_remaining: (limit - used).max(0),
            daily_limit: limit,
            reset_date: next_utc_midnight(now),
            tier,
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

fn next_utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    let tomorrow = now.date_naive().succ_opt().unwrap_or(now.date_naive());
    tomorrow.and_time(NaiveTime::MIN).and_utc()
}

fn day_ttl(now: DateTime<Utc>) -> Duration {
    let until_midnight = (next_utc_midnight(now) - now)
        .to_std()
        .unwrap_or(Duration::from_secs(60));
    until_midnight + EXPIRY_SLACK
}

fn quota_message(limit: i64, reset: DateTime<Utc>) -> String {
    format!(
        "Daily limit of {limit} conversions reached. Resets at {}",
        reset.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}
