//! Usage tiers and their quotas.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docmill_core::AppError;
use docmill_core::config::gate::GateConfig;

/// Subscription level governing daily conversion quota and maximum input
/// file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    /// No account; identified by fingerprint or IP.
    Anonymous,
    /// Registered account without a subscription.
    Free,
    /// Paid subscription.
    Premium,
}

impl Tier {
    /// The configured daily conversion quota for this tier.
    pub fn daily_limit(&self, config: &GateConfig) -> i64 {
        match self {
            Self::Anonymous => config.anonymous_daily_limit,
            Self::Free => config.free_daily_limit,
            Self::Premium => config.premium_daily_limit,
        }
    }

    /// The configured maximum input file size in bytes for this tier.
    pub fn max_file_size(&self, config: &GateConfig) -> u64 {
        match self {
            Self::Anonymous | Self::Free => config.max_file_size_free,
            Self::Premium => config.max_file_size_premium,
        }
    }

    /// Return the tier as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "ANONYMOUS",
            Self::Free => "FREE",
            Self::Premium => "PREMIUM",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ANONYMOUS" => Ok(Self::Anonymous),
            "FREE" => Ok(Self::Free),
            "PREMIUM" => Ok(Self::Premium),
            other => Err(AppError::validation(format!("Unknown tier: {other}"))),
        }
    }
}
