//! Usage snapshot returned by the gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tier::Tier;

/// A caller's usage standing for the current period.
///
/// Field names are camelCase on the wire; `resetDate` is the next UTC
/// midnight, when the daily counters roll over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    /// Conversions consumed in the current period.
    pub conversions_used: i64,
    /// Conversions left before the gate rejects.
    pub conversions_remaining: i64,
    /// The tier's daily quota.
    pub daily_limit: i64,
    /// When the current period ends.
    pub reset_date: DateTime<Utc>,
    /// The tier the quota was computed for.
    pub tier: Tier,
}
