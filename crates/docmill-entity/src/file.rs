//! Stored file records.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docmill_core::types::FileId;

/// Result of persisting bytes through the storage manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    /// Path the bytes were written to.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

/// An uploaded input file tracked for the duration of a conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Unique file identifier.
    pub id: FileId,
    /// Name the client supplied.
    pub original_name: String,
    /// Stored path under the upload directory.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// MIME type derived from the original extension.
    pub mime_type: String,
    /// When the upload was persisted.
    pub created_at: DateTime<Utc>,
}
