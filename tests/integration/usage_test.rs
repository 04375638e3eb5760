//! Integration tests for the usage endpoint.

use http::StatusCode;

use crate::helpers::{TestApp, pdf_bytes};

#[tokio::test]
async fn test_fresh_anonymous_caller_has_full_quota() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/usage", &[]).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["conversionsUsed"], 0);
    assert_eq!(
        response.body["dailyLimit"],
        app.config.gate.anonymous_daily_limit
    );
    assert_eq!(
        response.body["conversionsRemaining"],
        app.config.gate.anonymous_daily_limit
    );
    assert_eq!(response.body["tier"], "ANONYMOUS");
    assert!(response.body.get("resetDate").is_some());
}

#[tokio::test]
async fn test_tier_headers_select_the_limit() {
    let app = TestApp::new().await;

    let premium = app
        .request(
            "GET",
            "/api/usage",
            &[("x-user-id", "u-9"), ("x-user-tier", "PREMIUM")],
        )
        .await;
    assert_eq!(premium.body["tier"], "PREMIUM");
    assert_eq!(
        premium.body["dailyLimit"],
        app.config.gate.premium_daily_limit
    );

    // An account without a tier header is treated as free.
    let free = app
        .request("GET", "/api/usage", &[("x-user-id", "u-9")])
        .await;
    assert_eq!(free.body["tier"], "FREE");
    assert_eq!(free.body["dailyLimit"], app.config.gate.free_daily_limit);
}

#[tokio::test]
async fn test_snapshot_reflects_conversions() {
    let app = TestApp::new().await;
    let caller = [("x-fingerprint", "fp-snapshot")];
    let input = pdf_bytes(&["page"]);

    let converted = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("doc.pdf"), &input),
            ],
            &caller,
        )
        .await;
    assert_eq!(converted.status, StatusCode::OK, "{:?}", converted.body);

    let usage = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(usage.body["conversionsUsed"], 1);
    assert_eq!(
        usage.body["conversionsRemaining"],
        app.config.gate.anonymous_daily_limit - 1
    );

    // A different fingerprint is accounted separately.
    let other = app
        .request("GET", "/api/usage", &[("x-fingerprint", "fp-other")])
        .await;
    assert_eq!(other.body["conversionsUsed"], 0);
}

#[tokio::test]
async fn test_reading_usage_never_consumes_quota() {
    let app = TestApp::new().await;
    let caller = [("x-fingerprint", "fp-read-only")];

    for _ in 0..4 {
        let response = app.request("GET", "/api/usage", &caller).await;
        assert_eq!(response.status, StatusCode::OK);
    }

    let response = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(response.body["conversionsUsed"], 0);
}
