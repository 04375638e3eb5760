//! PDF splitting.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, SplitMode, SplitOptions};

use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::{bundle, pages, pdf};

/// Splits a PDF into per-page, per-range, or every-N-page parts.
///
/// A single part comes back as a plain PDF; multiple parts are packaged
/// into one ZIP archive.
#[derive(Debug, Default)]
pub struct SplitPdf;

impl SplitPdf {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for SplitPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::SplitPdf
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::SplitPdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for split-pdf"));
        };

        let input = request.input()?.to_path_buf();
        let out_dir = request.output_dir.clone();
        let base = request.base_stem();

        request.progress.report(10);
        let output = tokio::task::spawn_blocking(move || split_file(&input, &out_dir, &base, &options))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Split task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

fn split_file(
    input: &Path,
    out_dir: &Path,
    base: &str,
    options: &SplitOptions,
) -> AppResult<PathBuf> {
    let doc = pdf::load(input)?;
    let total = doc.get_pages().len() as u32;
    if total == 0 {
        return Err(AppError::validation("PDF has no pages"));
    }

    let ranges: Vec<(u32, u32)> = match options.mode {
        SplitMode::All => (1..=total).map(|p| (p, p)).collect(),
        SplitMode::Range => {
            let expr = options
                .pages
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| AppError::validation("Range mode requires a pages expression"))?;
            pages::parse_ranges(expr, total)?
        }
        SplitMode::Every => {
            let every = options.every_n.unwrap_or(1);
            if every == 0 {
                return Err(AppError::validation("everyN must be at least 1"));
            }
            pages::chunks(total, every)
        }
    };

    let mut parts: Vec<(String, Vec<u8>)> = Vec::with_capacity(ranges.len());
    for (index, &(start, end)) in ranges.iter().enumerate() {
        let bytes = extract_range(&doc, total, start, end)?;
        let name = if start == end {
            format!("{base}_page_{start}_{}.pdf", index + 1)
        } else {
            format!("{base}_pages_{start}-{end}_{}.pdf", index + 1)
        };
        parts.push((name, bytes));
    }

    if parts.len() == 1 {
        let (name, bytes) = parts.swap_remove(0);
        let path = out_dir.join(name);
        std::fs::write(&path, bytes).map_err(|e| {
            AppError::with_source(ErrorKind::Io, "Failed to write split output", e)
        })?;
        return Ok(path);
    }

    let zip_path = out_dir.join(format!("{base}_split.zip"));
    bundle::write_zip(&zip_path, &parts)?;
    Ok(zip_path)
}

/// Serialize a copy of the document holding only pages `start..=end`.
fn extract_range(doc: &lopdf::Document, total: u32, start: u32, end: u32) -> AppResult<Vec<u8>> {
    let mut part = doc.clone();
    let drop: Vec<u32> = (1..=total).filter(|p| *p < start || *p > end).collect();
    if !drop.is_empty() {
        part.delete_pages(&drop);
    }
    part.prune_objects();
    part.compress();

    let mut bytes = Vec::new();
    part.save_to(&mut bytes).map_err(|e| {
        AppError::with_source(ErrorKind::Internal, "Failed to serialize split part", e)
    })?;
    Ok(bytes)
}
