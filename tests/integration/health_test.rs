//! Integration tests for the health endpoint.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_reports_ok() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/health", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(
        response.body["version"]
            .as_str()
            .is_some_and(|v| !v.is_empty())
    );
    assert!(response.body.get("timestamp").is_some());
}

#[tokio::test]
async fn test_health_needs_no_identity_headers() {
    let app = TestApp::new().await;

    // Repeated checks are never throttled or counted against a quota.
    for _ in 0..3 {
        let response = app.request("GET", "/api/health", &[]).await;
        assert_eq!(response.status, StatusCode::OK);
    }
}
