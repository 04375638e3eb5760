//! Integration tests for the cleanup endpoint.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_cleanup_requires_the_shared_secret() {
    let app = TestApp::new().await;

    let missing = app.request("GET", "/api/cleanup", &[]).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["error"], "UNAUTHORIZED");

    let wrong = app
        .request("GET", "/api/cleanup", &[("x-cleanup-secret", "guess")])
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cleanup_refuses_when_unconfigured() {
    let app = TestApp::with_config(|c| c.storage.cleanup_secret.clear()).await;

    let response = app
        .request("GET", "/api/cleanup", &[("x-cleanup-secret", "anything")])
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["error"], "CONFIGURATION");
}

#[tokio::test]
async fn test_cleanup_sweeps_expired_artifacts() {
    let app = TestApp::with_config(|c| c.storage.expiry_hours = 0).await;
    app.seed_artifact("stale.pdf", b"%PDF-1.4 old").await;

    let response = app
        .request("GET", "/api/cleanup", &[("x-cleanup-secret", "sweep-me")])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["deletedCount"], 1);
    assert_eq!(response.body["deletedFiles"][0], "stale.pdf");
    assert!(response.body.get("timestamp").is_some());

    let download = app.request("GET", "/api/download/stale.pdf", &[]).await;
    assert_eq!(download.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cleanup_leaves_fresh_artifacts_alone() {
    let app = TestApp::new().await;
    app.seed_artifact("fresh.pdf", b"%PDF-1.4 new").await;

    let response = app
        .request("GET", "/api/cleanup", &[("x-cleanup-secret", "sweep-me")])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deletedCount"], 0);

    let download = app.request("GET", "/api/download/fresh.pdf", &[]).await;
    assert_eq!(download.status, StatusCode::OK);
}
