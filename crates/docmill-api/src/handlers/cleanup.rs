//! Expiry sweep trigger.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::Utc;
use tracing::info;

use docmill_core::error::AppError;

use crate::dto::CleanupResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/cleanup
///
/// Runs an immediate sweep of the working directories. Guarded by a
/// shared secret so an external scheduler can call it; until a secret is
/// configured the endpoint refuses everything.
pub async fn cleanup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>, ApiError> {
    let secret = state.config.storage.cleanup_secret.as_str();
    if secret.is_empty() {
        return Err(AppError::configuration("Cleanup secret is not configured").into());
    }

    let provided = headers
        .get("x-cleanup-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != secret {
        return Err(AppError::unauthorized("Invalid cleanup secret").into());
    }

    let report = state.sweeper.sweep().await;
    info!(
        deleted = report.deleted_count,
        errors = report.errors.len(),
        "Cleanup triggered via API"
    );

    Ok(Json(CleanupResponse {
        success: true,
        report,
        timestamp: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    use docmill_core::error::ErrorKind;

    use crate::testutil::{test_state, test_state_with};

    fn headers_with_secret(secret: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-cleanup-secret", secret.parse().unwrap());
        headers
    }

    #[tokio::test]
    async fn refuses_when_no_secret_is_configured() {
        let (_dir, state) = test_state().await;
        let err = cleanup(State(state), headers_with_secret("anything"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0.kind, ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn rejects_a_wrong_secret() {
        let (_dir, state) =
            test_state_with(|c| c.storage.cleanup_secret = "s3cret".to_string()).await;

        let err = cleanup(State(state.clone()), headers_with_secret("wrong"))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0.kind, ErrorKind::Unauthorized);

        let err = cleanup(State(state), HeaderMap::new()).await.err().unwrap();
        assert_eq!(err.0.kind, ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn sweeps_expired_files() {
        let (_dir, state) = test_state_with(|c| {
            c.storage.cleanup_secret = "s3cret".to_string();
            c.storage.expiry_hours = 0;
        })
        .await;

        let stale = state.storage.upload_dir().join("stale.pdf");
        std::fs::write(&stale, b"old").unwrap();

        let Json(body) = cleanup(State(state), headers_with_secret("s3cret"))
            .await
            .unwrap();

        assert!(body.success);
        assert_eq!(body.report.deleted_count, 1);
        assert_eq!(body.report.deleted_files, vec!["stale.pdf".to_string()]);
        assert!(!stale.exists());
    }
}
