//! Shared fixtures for handler tests.

use std::sync::Arc;

use tempfile::TempDir;

use docmill_cache::memory::MemoryCounterStore;
use docmill_convert::Dispatcher;
use docmill_core::config::AppConfig;
use docmill_gate::{IpThrottle, UsageGate};
use docmill_storage::{StorageManager, Sweeper};

use crate::state::AppState;

/// Multipart boundary used by [`multipart_body`].
pub(crate) const BOUNDARY: &str = "docmill-test-boundary";

/// Build a full application state over temp directories.
///
/// The returned guard keeps the directories alive for the test.
pub(crate) async fn test_state() -> (TempDir, AppState) {
    test_state_with(|_| {}).await
}

/// Like [`test_state`] but lets the test adjust the configuration first.
pub(crate) async fn test_state_with(tweak: impl FnOnce(&mut AppConfig)) -> (TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = AppConfig::default();
    config.storage.upload_dir = dir.path().join("uploads").to_string_lossy().into_owned();
    config.storage.temp_dir = dir.path().join("tmp").to_string_lossy().into_owned();
    tweak(&mut config);

    let storage = Arc::new(StorageManager::new(&config.storage).await.unwrap());
    let dispatcher = Arc::new(Dispatcher::new(&config.convert));
    let store = Arc::new(MemoryCounterStore::new());
    let gate = UsageGate::new(store.clone(), config.gate.clone());
    let throttle = IpThrottle::new(store, &config.gate);
    let sweeper = Arc::new(Sweeper::new(&config.storage));

    let state = AppState {
        config: Arc::new(config),
        storage,
        dispatcher,
        gate,
        throttle,
        sweeper,
    };
    (dir, state)
}

/// Encode form fields into a `multipart/form-data` body.
///
/// Each part is `(field name, optional file name, data)`.
pub(crate) fn multipart_body(parts: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
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
