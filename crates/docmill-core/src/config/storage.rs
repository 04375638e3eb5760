//! Upload and temp directory configuration.

use serde::{Deserialize, Serialize};

/// File storage configuration.
///
/// Uploaded inputs land in `upload_dir`, intermediate and converted
/// artifacts in `temp_dir`. Both are swept once files outlive
/// `expiry_hours`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded input files.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Directory for intermediate and output artifacts.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: String,
    /// Age in hours after which a stored file becomes eligible for deletion.
    #[serde(default = "default_expiry_hours")]
    pub expiry_hours: u64,
    /// Shared secret required by the HTTP cleanup trigger.
    /// Empty disables the endpoint.
    #[serde(default)]
    pub cleanup_secret: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            temp_dir: default_temp_dir(),
            expiry_hours: default_expiry_hours(),
            cleanup_secret: String::new(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_upload_dir() -> String {
    "./uploads".to_string()
}

fn default_temp_dir() -> String {
    "./tmp".to_string()
}

fn default_expiry_hours() -> u64 {
    1
}

fn default_max_upload() -> u64 {
    52_428_800 // 50 MB
}
