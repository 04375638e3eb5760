//! Usage snapshot handler.

use axum::Json;
use axum::extract::State;

use docmill_entity::usage::UsageData;

use crate::error::ApiError;
use crate::extract::RequestIdentity;
use crate::state::AppState;

/// GET /api/usage
///
/// Read-only quota standing for the caller; never consumes a slot.
pub async fn usage(
    State(state): State<AppState>,
    caller: RequestIdentity,
) -> Result<Json<UsageData>, ApiError> {
    let data = state.gate.usage(&caller.identity, caller.tier).await?;
    Ok(Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::net::{IpAddr, Ipv4Addr};

    use docmill_entity::identity::Identity;
    use docmill_entity::tier::Tier;

    use crate::testutil::test_state;

    fn caller() -> RequestIdentity {
        RequestIdentity {
            identity: Identity::Fingerprint("fp-usage".to_string()),
            tier: Tier::Anonymous,
            ip: IpAddr::V4(Ipv4Addr::new(203, 0, 113, 77)),
        }
    }

    #[tokio::test]
    async fn fresh_identity_has_full_quota() {
        let (_dir, state) = test_state().await;
        let Json(data) = usage(State(state.clone()), caller()).await.unwrap();

        assert_eq!(data.conversions_used, 0);
        assert_eq!(data.daily_limit, state.config.gate.anonymous_daily_limit);
        assert_eq!(data.conversions_remaining, data.daily_limit);
        assert_eq!(data.tier, Tier::Anonymous);
    }

    #[tokio::test]
    async fn snapshot_reflects_consumed_slots() {
        let (_dir, state) = test_state().await;
        let caller = caller();

        state
            .gate
            .check_and_increment(&caller.identity, caller.tier)
            .await
            .unwrap();

        let Json(data) = usage(State(state), caller).await.unwrap();
        assert_eq!(data.conversions_used, 1);
    }

    #[tokio::test]
    async fn snapshot_does_not_consume_quota() {
        let (_dir, state) = test_state().await;
        let caller = caller();

        for _ in 0..3 {
            usage(State(state.clone()), caller.clone()).await.unwrap();
        }

        let Json(data) = usage(State(state), caller).await.unwrap();
        assert_eq!(data.conversions_used, 0);
    }
}
