//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{HeaderMap, Request, StatusCode};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use docmill_cache::memory::MemoryCounterStore;
use docmill_convert::Dispatcher;
use docmill_core::config::AppConfig;
use docmill_gate::{IpThrottle, UsageGate};
use docmill_storage::{StorageManager, Sweeper};

/// Multipart boundary used by [`TestApp::convert`]
pub const BOUNDARY: &str = "docmill-integration-boundary";

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config
    pub config: AppConfig,
    /// Storage manager for seeding and inspecting artifacts
    pub storage: Arc<StorageManager>,
    /// Keeps the working directories alive for the duration of the test
    _workdir: TempDir,
}

impl TestApp {
    /// Create a new test application over fresh working directories
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Like [`TestApp::new`] but lets the test adjust the configuration first
    pub async fn with_config(tweak: impl FnOnce(&mut AppConfig)) -> Self {
        let workdir = tempfile::tempdir().expect("Failed to create temp dir");

        let mut config = AppConfig::default();
        config.storage.upload_dir = workdir
            .path()
            .join("uploads")
            .to_string_lossy()
            .into_owned();
        config.storage.temp_dir = workdir.path().join("tmp").to_string_lossy().into_owned();
        config.storage.cleanup_secret = "sweep-me".to_string();
        tweak(&mut config);

        let storage = Arc::new(
            StorageManager::new(&config.storage)
                .await
                .expect("Failed to init storage"),
        );
        let dispatcher = Arc::new(Dispatcher::new(&config.convert));
        let counters = Arc::new(MemoryCounterStore::new());
        let gate = UsageGate::new(counters.clone(), config.gate.clone());
        let throttle = IpThrottle::new(counters, &config.gate);
        let sweeper = Arc::new(Sweeper::new(&config.storage));

        let state = docmill_api::AppState {
            config: Arc::new(config.clone()),
            storage: Arc::clone(&storage),
            dispatcher,
            gate,
            throttle,
            sweeper,
        };

        let router = docmill_api::build_app(state);

        Self {
            router,
            config,
            storage,
            _workdir: workdir,
        }
    }

    /// Place an artifact in the temp dir, as a completed conversion would
    pub async fn seed_artifact(&self, name: &str, data: &[u8]) {
        self.storage
            .save_temp(name, data.to_vec().into())
            .await
            .expect("Failed to seed artifact");
    }

    /// Make a bodyless HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::empty())
            .expect("Failed to build request");

        self.send(request).await
    }

    /// Submit a conversion as a multipart form.
    ///
    /// Each part is `(field name, optional file name, data)`.
    pub async fn convert(
        &self,
        parts: &[(&str, Option<&str>, &[u8])],
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/convert")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder
            .body(Body::from(multipart_body(parts)))
            .expect("Failed to build request");

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024 * 1024)
            .await
            .expect("Failed to read body");
        let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes: bytes.to_vec(),
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Parsed JSON body; `Null` when the body is not JSON
    pub body: Value,
    /// Raw body bytes, for binary downloads
    pub bytes: Vec<u8>,
}

/// Encode form fields into a `multipart/form-data` body.
///
/// Each part is `(field name, optional file name, data)`.
pub fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, file_name, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match file_name {
            Some(file) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Build an in-memory PDF with one page per entry in `texts`, Letter-sized,
/// with the text drawn in Helvetica.
pub fn pdf_bytes(texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}
