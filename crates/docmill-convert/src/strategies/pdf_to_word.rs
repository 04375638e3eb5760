//! PDF text extraction into DOCX.

use std::path::Path;

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::ConversionOptions;

use crate::office;
use crate::strategy::{ConversionStrategy, ConvertRequest};

/// Extracts PDF text and wraps it into a minimal DOCX, one paragraph per
/// line. Layout, images, and styling do not survive.
#[derive(Debug, Default)]
pub struct PdfToWord;

impl PdfToWord {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for PdfToWord {
    fn conversion(&self) -> ConversionType {
        ConversionType::PdfToWord
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::PdfToWord(_) = &request.options else {
            return Err(AppError::internal("Mismatched options for pdf-to-word"));
        };

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}.docx", request.base_stem()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || extract_to_docx(&input, &result_path))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Extraction task panicked", e)
            })??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

fn extract_to_docx(input: &Path, output: &Path) -> AppResult<()> {
    if !input.exists() {
        return Err(AppError::not_found(format!(
            "Input file not found: {}",
            input.display()
        )));
    }
    let text = pdf_extract::extract_text(input).map_err(|e| {
        AppError::with_source(
            ErrorKind::Validation,
            "Could not extract text from PDF",
            e,
        )
    })?;
    let bytes = office::docx_from_text(&text)?;
    std::fs::write(output, bytes)
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to write DOCX", e))
}
