//! The strategy seam every conversion implements.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::traits::progress::{NoopProgress, ProgressSink};
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::ConversionOptions;

/// A conversion request as the strategies see it.
///
/// `inputs` holds at least one stored file; only merge takes more than
/// one. Strategies write into `output_dir`, which the dispatcher points at
/// a private scratch directory so a failed run leaves nothing behind.
#[derive(Clone)]
pub struct ConvertRequest {
    /// Stored input files, in client order.
    pub inputs: Vec<PathBuf>,
    /// Client-supplied name of the first input, used to seed output names.
    pub original_name: String,
    /// Typed options for the requested conversion.
    pub options: ConversionOptions,
    /// Directory the strategy must write its output into.
    pub output_dir: PathBuf,
    /// Checkpoint reporting.
    pub progress: Arc<dyn ProgressSink>,
}

impl ConvertRequest {
    /// Build a request with a no-op progress sink.
    pub fn new(
        inputs: Vec<PathBuf>,
        original_name: impl Into<String>,
        options: ConversionOptions,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            inputs,
            original_name: original_name.into(),
            options,
            output_dir: output_dir.into(),
            progress: Arc::new(NoopProgress),
        }
    }

    /// Attach a progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    /// The single input of a one-input conversion.
    pub fn input(&self) -> AppResult<&Path> {
        self.inputs
            .first()
            .map(PathBuf::as_path)
            .ok_or_else(|| AppError::internal("Request has no input files"))
    }

    /// Stem of the original file name, used to seed output names.
    pub fn base_stem(&self) -> String {
        Path::new(&self.original_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("document")
            .to_string()
    }
}

/// A single conversion implementation.
///
/// Strategies are stateless with respect to requests: the same input and
/// options may be retried safely. Failures come back in the application
/// error taxonomy, never as raw tool output.
#[async_trait]
pub trait ConversionStrategy: Send + Sync {
    /// The conversion this strategy implements.
    fn conversion(&self) -> ConversionType;

    /// The external binary this strategy prefers, when it has one.
    fn tool(&self) -> Option<&str> {
        None
    }

    /// Run the conversion, writing the result into `request.output_dir`.
    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use docmill_entity::options::ConversionOptions;

    fn request_named(name: &str) -> ConvertRequest {
        ConvertRequest::new(
            vec![PathBuf::from("/tmp/in.pdf")],
            name,
            ConversionOptions::default_for(ConversionType::RotatePdf).unwrap(),
            "/tmp/out",
        )
    }

    #[test]
    fn base_stem_drops_extension() {
        assert_eq!(request_named("report.final.pdf").base_stem(), "report.final");
        assert_eq!(request_named("scan.pdf").base_stem(), "scan");
    }

    #[test]
    fn base_stem_defaults_when_nameless() {
        assert_eq!(request_named("").base_stem(), "document");
    }

    #[test]
    fn input_requires_a_file() {
        let mut request = request_named("a.pdf");
        request.inputs.clear();
        assert!(request.input().is_err());
    }
}
