//! Integration tests for the conversion endpoint.

use http::StatusCode;
use lopdf::{Document, Object};

use crate::helpers::{TestApp, pdf_bytes};

#[tokio::test]
async fn test_rotate_pdf_end_to_end() {
    let app = TestApp::new().await;
    let input = pdf_bytes(&["quarterly report"]);

    let response = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("options", None, br#"{"rotation": 90}"#),
                ("file", Some("report.pdf"), &input),
            ],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["outputFile"], "report_rotated.pdf");
    assert_eq!(
        response.body["downloadUrl"],
        "/api/download/report_rotated.pdf"
    );
    assert!(response.body["size"].as_u64().unwrap() > 0);
    assert!(response.body.get("degraded").is_none());

    let download = app
        .request("GET", "/api/download/report_rotated.pdf", &[])
        .await;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(download.headers["content-type"], "application/pdf");

    let doc = Document::load_mem(&download.bytes).expect("Downloaded artifact is not a PDF");
    let pages: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(pages.len(), 1);
    let page = doc.get_dictionary(pages[0]).unwrap();
    assert_eq!(page.get(b"Rotate").unwrap(), &Object::Integer(90));
}

#[tokio::test]
async fn test_merge_pdf_end_to_end() {
    let app = TestApp::new().await;
    let first = pdf_bytes(&["first document"]);
    let second = pdf_bytes(&["second document"]);

    let response = app
        .convert(
            &[
                ("type", None, b"merge-pdf"),
                ("files", Some("first.pdf"), &first),
                ("files", Some("second.pdf"), &second),
            ],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    let name = response.body["outputFile"].as_str().unwrap().to_string();
    assert!(name.starts_with("merged_") && name.ends_with(".pdf"), "{name}");

    let download = app
        .request("GET", &format!("/api/download/{name}"), &[])
        .await;
    assert_eq!(download.status, StatusCode::OK);

    let doc = Document::load_mem(&download.bytes).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
}

#[tokio::test]
async fn test_unknown_type_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .convert(
            &[
                ("type", None, b"pdf-to-stone-tablet"),
                ("file", Some("a.pdf"), b"%PDF-1.4"),
            ],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "UNSUPPORTED_CONVERSION");
}

#[tokio::test]
async fn test_corrupt_input_fails_with_validation() {
    let app = TestApp::new().await;

    let response = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("broken.pdf"), b"this is not a pdf"),
            ],
            &[],
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_failed_conversion_still_consumes_quota() {
    let app = TestApp::new().await;
    let caller = [("x-fingerprint", "fp-failure")];

    let response = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("broken.pdf"), b"garbage"),
            ],
            &caller,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let usage = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(usage.body["conversionsUsed"], 1);
}

#[tokio::test]
async fn test_quota_exhaustion_yields_429() {
    let app = TestApp::with_config(|c| c.gate.anonymous_daily_limit = 2).await;
    let caller = [("x-fingerprint", "fp-exhaust")];
    let input = pdf_bytes(&["page"]);

    for _ in 0..2 {
        let response = app
            .convert(
                &[
                    ("type", None, b"rotate-pdf"),
                    ("file", Some("doc.pdf"), &input),
                ],
                &caller,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    }

    let denied = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("doc.pdf"), &input),
            ],
            &caller,
        )
        .await;
    assert_eq!(denied.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(denied.body["error"], "QUOTA_EXCEEDED");
    assert!(
        denied.body["message"]
            .as_str()
            .unwrap()
            .contains("Resets at")
    );

    // The snapshot reports the limit, not the raw denied attempts.
    let usage = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(usage.body["conversionsUsed"], 2);
    assert_eq!(usage.body["conversionsRemaining"], 0);
}

#[tokio::test]
async fn test_identities_have_separate_quotas() {
    let app = TestApp::with_config(|c| c.gate.free_daily_limit = 1).await;
    let input = pdf_bytes(&["page"]);
    let submit = |caller: &'static str| {
        let app = &app;
        let input = input.clone();
        async move {
            app.convert(
                &[
                    ("type", None, b"rotate-pdf"),
                    ("file", Some("doc.pdf"), &input),
                ],
                &[("x-user-id", caller)],
            )
            .await
        }
    };

    assert_eq!(submit("user-a").await.status, StatusCode::OK);
    assert_eq!(
        submit("user-a").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(submit("user-b").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_ip_throttle_applies_before_quota() {
    let app = TestApp::with_config(|c| c.gate.ip_hourly_limit = 1).await;
    let input = pdf_bytes(&["page"]);
    let caller = [
        ("x-user-id", "premium-user"),
        ("x-user-tier", "premium"),
        ("x-forwarded-for", "203.0.113.80"),
    ];

    let first = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("doc.pdf"), &input),
            ],
            &caller,
        )
        .await;
    assert_eq!(first.status, StatusCode::OK, "{:?}", first.body);

    let throttled = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("doc.pdf"), &input),
            ],
            &caller,
        )
        .await;
    assert_eq!(throttled.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(
        throttled.body["message"]
            .as_str()
            .unwrap()
            .contains("Too many requests")
    );

    // The throttled request never reached the gate.
    let usage = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(usage.body["conversionsUsed"], 1);

    // Another address is unaffected.
    let other = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("doc.pdf"), &input),
            ],
            &[
                ("x-user-id", "premium-user"),
                ("x-user-tier", "premium"),
                ("x-forwarded-for", "203.0.113.81"),
            ],
        )
        .await;
    assert_eq!(other.status, StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected_before_admission() {
    let app = TestApp::with_config(|c| c.gate.max_file_size_free = 16).await;
    let caller = [("x-fingerprint", "fp-oversize")];

    let response = app
        .convert(
            &[
                ("type", None, b"rotate-pdf"),
                ("file", Some("big.pdf"), b"%PDF-1.4 twenty-five bytes"),
            ],
            &caller,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["message"].as_str().unwrap().contains("exceeds"));

    // Rejected before the gate, so no quota was spent.
    let usage = app.request("GET", "/api/usage", &caller).await;
    assert_eq!(usage.body["conversionsUsed"], 0);
}
