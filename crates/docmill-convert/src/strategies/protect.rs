//! PDF password protection.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{Object, dictionary};
use tracing::warn;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, ProtectOptions};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe};

/// Encrypts a PDF with qpdf (AES-256). Without qpdf on the host the
/// output degrades to a metadata-only marker and the outcome says so.
pub struct ProtectPdf {
    qpdf_bin: String,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
}

impl ProtectPdf {
    pub fn new(config: &ConvertConfig, executor: ToolExecutor, probe: Arc<ToolProbe>) -> Self {
        Self {
            qpdf_bin: config.qpdf_bin.clone(),
            executor,
            probe,
        }
    }
}

#[async_trait]
impl ConversionStrategy for ProtectPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::ProtectPdf
    }

    fn tool(&self) -> Option<&str> {
        Some(&self.qpdf_bin)
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::ProtectPdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for protect-pdf"));
        };
        if options.user_password.is_empty() {
            return Err(AppError::validation("userPassword must not be empty"));
        }

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}_protected.pdf", request.base_stem()));
        request.progress.report(10);

        if self.probe.available(&self.qpdf_bin).await {
            let args = qpdf_args(&input, &output, &options);
            self.executor.run(&self.qpdf_bin, &args).await?;
            self.executor.expect_output(&self.qpdf_bin, &output).await?;
            request.progress.report(90);
            return Ok(ConvertOutcome::new(output));
        }

        warn!("qpdf not available; writing marker-only protection");
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || mark_protected(&input, &result_path))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Protect task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::degraded(output))
    }
}

/// qpdf invocation: 256-bit AES with the requested permission flags.
/// Flags are omitted where the permission matches qpdf's default (allow).
fn qpdf_args(input: &Path, output: &Path, options: &ProtectOptions) -> Vec<String> {
    let owner = options
        .owner_password
        .clone()
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| options.user_password.clone());

    let mut args = vec![
        "--encrypt".to_string(),
        options.user_password.clone(),
        owner,
        "256".to_string(),
        format!("--print={}", options.permissions.printing.as_str()),
    ];
    if !options.permissions.modifying {
        args.push("--modify=none".to_string());
    }
    if !options.permissions.copying {
        args.push("--extract=n".to_string());
    }
    if !options.permissions.annotating {
        args.push("--annotate=n".to_string());
    }
    args.push("--".to_string());
    args.push(input.display().to_string());
    args.push(output.display().to_string());
    args
}

/// Degraded fallback: stamp the document information dictionary so the
/// output is visibly marked, without real encryption.
fn mark_protected(input: &Path, output: &Path) -> AppResult<()> {
    let mut doc = pdf::load(input)?;
    let stamp = format!("D:{}", chrono::Utc::now().format("%Y%m%d%H%M%S"));
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("PROTECTED DOCUMENT"),
        "Producer" => Object::string_literal("DocMill (protection marker, not encrypted)"),
        "Creator" => Object::string_literal("DocMill"),
        "CreationDate" => Object::string_literal(stamp.clone()),
        "ModDate" => Object::string_literal(stamp),
    });
    doc.trailer.set("Info", info_id);
    pdf::save(&mut doc, output)
}
