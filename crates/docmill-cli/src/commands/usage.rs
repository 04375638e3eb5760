//! Usage quota inspection.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use docmill_cache::CounterManager;
use docmill_entity::identity::Identity;
use docmill_entity::tier::Tier;
use docmill_gate::UsageGate;

use crate::output::{self, OutputFormat};

/// Arguments for the usage command
#[derive(Debug, Args)]
pub struct UsageArgs {
    /// Identity to inspect: `user:<id>`, an IP address, or a fingerprint
    #[arg(short, long, value_name = "KEY")]
    pub identity: Option<String>,

    /// Tier to evaluate the quota against
    #[arg(short, long, value_name = "TIER", default_value = "anonymous")]
    pub tier: String,
}

/// Usage display row for table output
#[derive(Debug, Serialize, Tabled)]
struct UsageRow {
    /// Identity key
    identity: String,
    /// Tier
    tier: String,
    /// Conversions used today
    used: i64,
    /// Conversions remaining
    remaining: i64,
    /// Daily limit
    limit: i64,
    /// Quota reset time
    resets: String,
}

/// Execute the usage command
pub async fn execute(args: &UsageArgs, env: &str, format: OutputFormat) -> anyhow::Result<()> {
    let config = super::load_config(env)?;

    let identity = match &args.identity {
        Some(key) => parse_identity(key),
        None => Identity::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST)),
    };
    let tier: Tier = args.tier.parse()?;

    let counters = Arc::new(CounterManager::new(&config.gate).await?);
    let gate = UsageGate::new(counters, config.gate.clone());
    let usage = gate.usage(&identity, tier).await?;

    let row = UsageRow {
        identity: identity.key(),
        tier: usage.tier.to_string(),
        used: usage.conversions_used,
        remaining: usage.conversions_remaining,
        limit: usage.daily_limit,
        resets: usage.reset_date.format("%Y-%m-%d %H:%M UTC").to_string(),
    };
    output::print_list(&[row], format);

    Ok(())
}

/// Map a raw key to an identity: a `user:` prefix, an IP literal, or a
/// bare fingerprint.
fn parse_identity(key: &str) -> Identity {
    if let Some(id) = key.strip_prefix("user:") {
        Identity::User(id.to_string())
    } else if let Ok(ip) = key.parse::<IpAddr>() {
        Identity::Ip(ip)
    } else {
        Identity::Fingerprint(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_keys_parse_by_shape() {
        assert_eq!(parse_identity("user:42"), Identity::User("42".into()));
        assert_eq!(
            parse_identity("203.0.113.9"),
            Identity::Ip("203.0.113.9".parse().unwrap())
        );
        assert_eq!(
            parse_identity("d41d8cd98f"),
            Identity::Fingerprint("d41d8cd98f".into())
        );
    }
}
