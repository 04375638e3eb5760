//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use docmill_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Optional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Response-side wrapper around [`AppError`].
///
/// Handlers return `Result<_, ApiError>` so the `?` operator converts any
/// domain error on the way out. The wrapper exists because `IntoResponse`
/// cannot be implemented for `AppError` outside the crate that owns it.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = match err.kind {
            ErrorKind::Validation
            | ErrorKind::UnsupportedConversion
            | ErrorKind::InvalidPassword
            | ErrorKind::EncryptedWithoutPassword => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ExternalTool => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Io
            | ErrorKind::Serialization
            | ErrorKind::Configuration
            | ErrorKind::Internal => {
                tracing::error!(error = %err, "Internal server error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiErrorResponse {
            error: err.kind.to_string(),
            message: err.message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn roundtrip(err: AppError) -> (StatusCode, ApiErrorResponse) {
        let response = ApiError::from(err).into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ApiErrorResponse = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn validation_maps_to_400() {
        let (status, body) = roundtrip(AppError::validation("bad input")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "VALIDATION");
        assert_eq!(body.message, "bad input");
        assert!(body.details.is_none());
    }

    #[tokio::test]
    async fn unsupported_conversion_maps_to_400() {
        let (status, body) =
            roundtrip(AppError::unsupported_conversion("no such conversion")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "UNSUPPORTED_CONVERSION");
    }

    #[tokio::test]
    async fn password_kinds_map_to_400_with_distinct_codes() {
        let (status, body) = roundtrip(AppError::invalid_password("wrong password")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "INVALID_PASSWORD");

        let (status, body) =
            roundtrip(AppError::encrypted_without_password("password required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "ENCRYPTED_WITHOUT_PASSWORD");
    }

    #[tokio::test]
    async fn not_found_maps_to_404() {
        let (status, body) = roundtrip(AppError::not_found("gone")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "NOT_FOUND");
    }

    #[tokio::test]
    async fn unauthorized_maps_to_401() {
        let (status, body) = roundtrip(AppError::unauthorized("bad secret")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.error, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn quota_maps_to_429() {
        let (status, body) = roundtrip(AppError::quota_exceeded("limit reached")).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body.error, "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn tool_failures_map_to_gateway_statuses() {
        let (status, _) = roundtrip(AppError::external_tool("gs crashed")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = roundtrip(AppError::timeout("too slow")).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn internal_family_maps_to_500() {
        for err in [
            AppError::io("disk failed"),
            AppError::internal("invariant broken"),
            AppError::configuration("missing setting"),
        ] {
            let (status, _) = roundtrip(err).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
