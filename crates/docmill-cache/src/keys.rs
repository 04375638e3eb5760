//! Counter key builders.
//!
//! Every counter key the application touches is constructed here, so the
//! window layout (UTC calendar day for quotas, UTC clock hour for the IP
//! throttle) lives in exactly one place.

use chrono::{DateTime, NaiveDate, Utc};

// ── Usage keys ─────────────────────────────────────────────

/// Counter key for an identity's conversions on a given UTC day.
///
/// `identity` is the rendered identity key (`user:…`, `fp:…` or `ip:…`).
/// Quotas reset at UTC midnight because the day stamp rolls over, not
/// because anything deletes the old key.
pub fn usage(identity: &str, day: NaiveDate) -> String {
    format!("usage:{identity}:{}", day.format("%Y%m%d"))
}

// ── Throttle keys ──────────────────────────────────────────

/// Counter key for an IP's requests in a given UTC clock hour.
pub fn ip_throttle(ip: &str, hour: DateTime<Utc>) -> String {
    format!("throttle:{ip}:{}", hour.format("%Y%m%d%H"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    #[test]
    fn test_usage_key() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(usage("user:u-123", day), "usage:user:u-123:20250309");
    }

    #[test]
    fn test_usage_key_rolls_with_the_day() {
        let before = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let after = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_ne!(usage("fp:abc", before), usage("fp:abc", after));
    }

    #[test]
    fn test_ip_throttle_key() {
        let hour = Utc.with_ymd_and_hms(2025, 3, 9, 17, 45, 0).unwrap();
        assert_eq!(
            ip_throttle("203.0.113.9", hour),
            "throttle:203.0.113.9:2025030917"
        );
    }
}
