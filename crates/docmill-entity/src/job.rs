//! Conversion job lifecycle types.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use docmill_core::types::JobId;

use crate::conversion::ConversionType;
use crate::options::ConversionOptions;

/// Lifecycle state of a conversion job.
///
/// Valid transitions: `idle → uploading → processing → completed | error`.
/// The terminal states transition back to `idle` only via an explicit
/// reset. No transition is triggered by the passage of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// No job in flight.
    Idle,
    /// Input bytes are being persisted.
    Uploading,
    /// A strategy is executing.
    Processing,
    /// The artifact is ready for download.
    Completed,
    /// The job failed; the message explains why.
    Error,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Uploading => "uploading",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single conversion job.
///
/// The record is ephemeral: it lives for the duration of one conversion
/// and is never persisted. Durability belongs to the artifact, not the
/// job metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Unique job identifier.
    pub id: JobId,
    /// The requested transformation.
    pub conversion: ConversionType,
    /// Options the transformation runs with.
    pub options: ConversionOptions,
    /// Original name of the uploaded input.
    pub input_name: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Completion percentage, 0-100, non-decreasing while in flight.
    pub progress: u8,
    /// Output artifact, present only when `completed`.
    pub output_path: Option<PathBuf>,
    /// Failure message, present only when `error`.
    pub error: Option<String>,
}

impl ConversionJob {
    /// Create a fresh idle job for a conversion of `input_name`.
    pub fn new(
        conversion: ConversionType,
        options: ConversionOptions,
        input_name: impl Into<String>,
    ) -> Self {
        Self {
            id: JobId::new(),
            conversion,
            options,
            input_name: input_name.into(),
            status: JobStatus::Idle,
            progress: 0,
            output_path: None,
            error: None,
        }
    }
}
