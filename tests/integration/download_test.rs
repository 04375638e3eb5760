//! Integration tests for artifact downloads.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_download_streams_the_artifact() {
    let app = TestApp::new().await;
    app.seed_artifact("letter_compressed.pdf", b"%PDF-1.4 artifact body")
        .await;

    let response = app
        .request("GET", "/api/download/letter_compressed.pdf", &[])
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["content-type"], "application/pdf");
    assert_eq!(
        response.headers["content-disposition"],
        "attachment; filename=\"letter_compressed.pdf\""
    );
    assert_eq!(response.headers["content-length"], "22");
    assert_eq!(response.bytes, b"%PDF-1.4 artifact body");
}

#[tokio::test]
async fn test_download_maps_extension_to_content_type() {
    let app = TestApp::new().await;
    for (name, mime) in [
        ("pages.zip", "application/zip"),
        ("scan_ocr.txt", "text/plain"),
        (
            "table.xlsx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ),
    ] {
        app.seed_artifact(name, b"data").await;
        let response = app
            .request("GET", &format!("/api/download/{name}"), &[])
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.headers["content-type"], mime, "{name}");
    }
}

#[tokio::test]
async fn test_download_rejects_path_traversal() {
    let app = TestApp::new().await;
    app.seed_artifact("real.pdf", b"%PDF-1.4").await;

    for path in [
        "/api/download/..%2Freal.pdf",
        "/api/download/%2e%2e",
        "/api/download/a%2Fb.pdf",
        "/api/download/..%5Creal.pdf",
    ] {
        let response = app.request("GET", path, &[]).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(response.body["error"], "VALIDATION");
    }
}

#[tokio::test]
async fn test_download_missing_artifact_is_404() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/download/never-made.pdf", &[]).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}
