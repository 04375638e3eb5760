//! Expiry sweep for the working directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use docmill_core::config::storage::StorageConfig;

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    /// Number of files deleted.
    pub deleted_count: usize,
    /// Names of the deleted files.
    pub deleted_files: Vec<String>,
    /// Per-file failures. A failure never stops the sweep.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SweepReport {
    fn absorb(&mut self, other: SweepReport) {
        self.deleted_count += other.deleted_count;
        self.deleted_files.extend(other.deleted_files);
        self.errors.extend(other.errors);
    }
}

/// Deletes expired files from the upload and temp directories.
///
/// Only direct children are considered and subdirectories are never
/// touched. A file expires when its modification time is older than the
/// configured age.
#[derive(Debug, Clone)]
pub struct Sweeper {
    /// Directories to sweep.
    dirs: Vec<PathBuf>,
    /// Age past which a file is deleted.
    max_age: Duration,
}

impl Sweeper {
    /// Build a sweeper over the configured working directories.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            dirs: vec![
                PathBuf::from(&config.upload_dir),
                PathBuf::from(&config.temp_dir),
            ],
            max_age: Duration::from_secs(config.expiry_hours * 3600),
        }
    }

    /// Build a sweeper over explicit directories.
    pub fn from_dirs(dirs: Vec<PathBuf>, max_age: Duration) -> Self {
        Self { dirs, max_age }
    }

    /// Delete every expired file and report what happened.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();
        for dir in &self.dirs {
            report.absorb(sweep_dir(dir, self.max_age).await);
        }
        if report.deleted_count > 0 || !report.errors.is_empty() {
            debug!(
                deleted = report.deleted_count,
                errors = report.errors.len(),
                "Sweep finished"
            );
        }
        report
    }
}

/// Sweep a single directory. A missing directory contributes nothing.
async fn sweep_dir(dir: &Path, max_age: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
        Err(e) => {
            report
                .errors
                .push(format!("Failed to read {}: {e}", dir.display()));
            return report;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                report
                    .errors
                    .push(format!("Failed to read entry in {}: {e}", dir.display()));
                break;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let metadata = match entry.metadata().await {
            Ok(m) => m,
            Err(e) => {
                report.errors.push(format!("Failed to stat {name}: {e}"));
                continue;
            }
        };
        if metadata.is_dir() {
            continue;
        }

        // An unreadable or future mtime counts as fresh.
        let age = metadata
            .modified()
            .ok()
            .and_then(|t| t.elapsed().ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(entry.path()).await {
            Ok(()) => {
                report.deleted_count += 1;
                report.deleted_files.push(name);
            }
            Err(e) => report.errors.push(format!("Failed to delete {name}: {e}")),
        }
    }

    report
}
