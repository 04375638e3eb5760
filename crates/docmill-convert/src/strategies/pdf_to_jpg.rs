//! PDF rasterization via pdftoppm.
//!
//! The only strategy with no native fallback: rendering PDF content
//! needs a rasterizer, so a missing pdftoppm is a hard error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, PdfToJpgOptions, RasterPages};

use crate::bundle;
use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe};

/// Prefix pdftoppm writes rendered pages under.
const RENDER_PREFIX: &str = "page";

pub struct PdfToJpg {
    pdftoppm_bin: String,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
}

impl PdfToJpg {
    pub fn new(config: &ConvertConfig, executor: ToolExecutor, probe: Arc<ToolProbe>) -> Self {
        Self {
            pdftoppm_bin: config.pdftoppm_bin.clone(),
            executor,
            probe,
        }
    }
}

#[async_trait]
impl ConversionStrategy for PdfToJpg {
    fn conversion(&self) -> ConversionType {
        ConversionType::PdfToJpg
    }

    fn tool(&self) -> Option<&str> {
        Some(&self.pdftoppm_bin)
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::PdfToJpg(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for pdf-to-jpg"));
        };
        if !self.probe.available(&self.pdftoppm_bin).await {
            return Err(AppError::external_tool(
                "pdftoppm (poppler-utils) is required for pdf-to-jpg",
            ));
        }

        let input = request.input()?;
        let base = request.base_stem();
        let prefix = request.output_dir.join(RENDER_PREFIX);

        let mut args = vec![
            "-jpeg".to_string(),
            "-r".to_string(),
            options.dpi.to_string(),
            "-jpegopt".to_string(),
            format!("quality={}", options.quality.clamp(1, 100)),
        ];
        if options.pages == RasterPages::First {
            args.extend(["-f".to_string(), "1".to_string(), "-l".to_string(), "1".to_string()]);
        }
        args.push(input.display().to_string());
        args.push(prefix.display().to_string());

        request.progress.report(10);
        self.executor.run(&self.pdftoppm_bin, &args).await?;
        request.progress.report(60);

        let rendered = collect_rendered(&request.output_dir).await?;
        if rendered.is_empty() {
            return Err(AppError::external_tool("pdftoppm produced no pages"));
        }

        // Renumber into stable three-padded names.
        let mut finals: Vec<PathBuf> = Vec::with_capacity(rendered.len());
        for (index, (_, path)) in rendered.into_iter().enumerate() {
            let name = format!("{base}_page_{:03}.jpg", index + 1);
            let target = request.output_dir.join(&name);
            tokio::fs::rename(&path, &target).await.map_err(|e| {
                AppError::with_source(ErrorKind::Io, "Failed to rename rendered page", e)
            })?;
            finals.push(target);
        }
        request.progress.report(80);

        if finals.len() == 1 {
            return Ok(ConvertOutcome::new(finals.remove(0)));
        }

        let mut entries = Vec::with_capacity(finals.len());
        for path in &finals {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                AppError::with_source(ErrorKind::Io, "Failed to read rendered page", e)
            })?;
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();
            entries.push((name, bytes));
        }
        let zip_path = request.output_dir.join(format!("{base}_images.zip"));
        bundle::write_zip(&zip_path, &entries)?;

        for path in &finals {
            let _ = tokio::fs::remove_file(path).await;
        }
        request.progress.report(90);

        Ok(ConvertOutcome::new(zip_path))
    }
}

/// Rendered pages under the work dir, sorted by page number. pdftoppm
/// zero-pads the counter to the page-count width, so sorting must be
/// numeric, not lexical.
async fn collect_rendered(dir: &Path) -> AppResult<Vec<(u32, PathBuf)>> {
    let mut rendered = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to list rendered pages", e))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to list rendered pages", e))?
    {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(number) = page_number(name) {
            rendered.push((number, entry.path()));
        }
    }
    rendered.sort_by_key(|(number, _)| *number);
    Ok(rendered)
}

fn page_number(name: &str) -> Option<u32> {
    name.strip_prefix(RENDER_PREFIX)?
        .strip_prefix('-')?
        .strip_suffix(".jpg")?
        .parse()
        .ok()
}
