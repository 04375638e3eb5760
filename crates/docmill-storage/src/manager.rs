//! Storage manager for the upload and temp working areas.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, warn};

use docmill_core::config::storage::StorageConfig;
use docmill_core::error::{AppError, ErrorKind};
use docmill_core::result::AppResult;
use docmill_core::types::FileId;
use docmill_entity::file::{StoredFile, UploadedFile};

use crate::mime;

/// Manages the two working directories: `upload` for client input and
/// `temp` for conversion output.
///
/// Files in both areas are transient. Nothing here tracks them beyond the
/// filesystem itself; the sweeper reclaims whatever outlives the expiry
/// window.
#[derive(Debug, Clone)]
pub struct StorageManager {
    /// Directory for client uploads.
    upload_dir: PathBuf,
    /// Directory for conversion outputs.
    temp_dir: PathBuf,
}

impl StorageManager {
    /// Create a manager and ensure both directories exist.
    pub async fn new(config: &StorageConfig) -> AppResult<Self> {
        let manager = Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            temp_dir: PathBuf::from(&config.temp_dir),
        };
        for dir in [&manager.upload_dir, &manager.temp_dir] {
            fs::create_dir_all(dir).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to create storage directory: {}", dir.display()),
                    e,
                )
            })?;
        }
        Ok(manager)
    }

    /// Directory holding client uploads.
    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Directory holding conversion outputs.
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Persist an uploaded file under a fresh UUID name.
    ///
    /// The original extension is kept so downstream tools can recognise
    /// the format from the stored name alone.
    pub async fn save_upload(&self, original_name: &str, data: Bytes) -> AppResult<UploadedFile> {
        let id = FileId::new();
        let stored_name = match Path::new(original_name).extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        };
        let path = self.upload_dir.join(&stored_name);
        let size = data.len() as u64;

        fs::write(&path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Io,
                format!("Failed to write upload: {}", path.display()),
                e,
            )
        })?;

        debug!(name = original_name, stored = %path.display(), bytes = size, "Saved upload");

        Ok(UploadedFile {
            id,
            original_name: original_name.to_string(),
            path,
            size,
            mime_type: mime::mime_for_path(original_name).to_string(),
            created_at: Utc::now(),
        })
    }

    /// Write bytes into the temp area under the given name.
    pub async fn save_temp(&self, file_name: &str, data: Bytes) -> AppResult<StoredFile> {
        let path = self.temp_dir.join(file_name);
        fs::write(&path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Io,
                format!("Failed to write temp file: {}", path.display()),
                e,
            )
        })?;

        debug!(stored = %path.display(), bytes = data.len(), "Saved temp file");

        Ok(StoredFile {
            path,
            size: data.len() as u64,
        })
    }

    /// Build a path in the temp area without touching the filesystem.
    pub fn temp_path(&self, file_name: &str) -> PathBuf {
        self.temp_dir.join(file_name)
    }

    /// Open a temp file for streaming and return it with its size.
    pub async fn open_temp(&self, file_name: &str) -> AppResult<(fs::File, u64)> {
        let path = self.temp_dir.join(file_name);
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {file_name}"))
            } else {
                AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to open file: {file_name}"),
                    e,
                )
            }
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to stat file: {file_name}"),
                    e,
                )
            })?
            .len();
        Ok((file, size))
    }

    /// Read a whole file back into memory.
    pub async fn read(&self, path: &Path) -> AppResult<Bytes> {
        let data = fs::read(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to read file: {}", path.display()),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    /// Size of a file on disk.
    pub async fn file_size(&self, path: &Path) -> AppResult<u64> {
        let meta = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Io,
                    format!("Failed to stat file: {}", path.display()),
                    e,
                )
            }
        })?;
        Ok(meta.len())
    }

    /// Best-effort delete. Failures are logged, never propagated.
    pub async fn delete_quiet(&self, path: &Path) {
        if let Err(e) = fs::remove_file(path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Failed to delete file");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn make_manager() -> (tempfile::TempDir, StorageManager) {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            upload_dir: dir.path().join("uploads").to_string_lossy().into_owned(),
            temp_dir: dir.path().join("tmp").to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let manager = StorageManager::new(&config).await.unwrap();
        (dir, manager)
    }

    #[tokio::test]
    async fn test_save_upload_keeps_extension() {
        let (_dir, manager) = make_manager().await;

        let file = manager
            .save_upload("report.pdf", Bytes::from("%PDF-1.4"))
            .await
            .unwrap();

        let stored_name = file.path.file_name().unwrap().to_str().unwrap();
        assert!(stored_name.ends_with(".pdf"));
        let stem = stored_name.trim_end_matches(".pdf");
        assert!(stem.parse::<FileId>().is_ok());
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.size, 8);
        assert!(file.path.exists());
    }

    #[tokio::test]
    async fn test_save_upload_without_extension() {
        let (_dir, manager) = make_manager().await;

        let file = manager
            .save_upload("README", Bytes::from("hello"))
            .await
            .unwrap();

        let stored_name = file.path.file_name().unwrap().to_str().unwrap();
        assert!(stored_name.parse::<FileId>().is_ok());
        assert_eq!(file.mime_type, "application/octet-stream");
    }

    #[tokio::test]
    async fn test_save_temp_and_open() {
        let (_dir, manager) = make_manager().await;

        let stored = manager
            .save_temp("out.txt", Bytes::from("converted"))
            .await
            .unwrap();
        assert_eq!(stored.size, 9);

        let (_file, size) = manager.open_temp("out.txt").await.unwrap();
        assert_eq!(size, 9);

        let data = manager.read(&stored.path).await.unwrap();
        assert_eq!(data, Bytes::from("converted"));
    }

    #[tokio::test]
    async fn test_open_temp_missing_is_not_found() {
        let (_dir, manager) = make_manager().await;

        let err = manager.open_temp("nope.pdf").await.unwrap_err();
        assert_eq!(err.kind, docmill_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_delete_quiet_tolerates_missing() {
        let (_dir, manager) = make_manager().await;

        let stored = manager.save_temp("gone.txt", Bytes::from("x")).await.unwrap();
        manager.delete_quiet(&stored.path).await;
        assert!(!stored.path.exists());

        // Deleting again must not fail.
        manager.delete_quiet(&stored.path).await;
    }
}
