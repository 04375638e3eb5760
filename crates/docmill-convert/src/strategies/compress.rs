//! PDF compression.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{Document, Object, ObjectId};
use tracing::warn;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{CompressOptions, CompressQuality, ConversionOptions};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe};

/// Compresses a PDF with a Ghostscript preset, falling back to a native
/// pass (stream recompression plus JPEG re-encoding) when Ghostscript is
/// unavailable or fails.
pub struct CompressPdf {
    gs_bin: String,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
}

impl CompressPdf {
    pub fn new(config: &ConvertConfig, executor: ToolExecutor, probe: Arc<ToolProbe>) -> Self {
        Self {
            gs_bin: config.gs_bin.clone(),
            executor,
            probe,
        }
    }

    fn gs_preset(level: CompressQuality) -> &'static str {
        match level {
            CompressQuality::Low => "/screen",
            CompressQuality::Medium => "/ebook",
            CompressQuality::High => "/printer",
        }
    }

    async fn run_ghostscript(
        &self,
        input: &Path,
        output: &Path,
        level: CompressQuality,
    ) -> AppResult<()> {
        let args = vec![
            "-sDEVICE=pdfwrite".to_string(),
            "-dCompatibilityLevel=1.4".to_string(),
            format!("-dPDFSETTINGS={}", Self::gs_preset(level)),
            "-dNOPAUSE".to_string(),
            "-dQUIET".to_string(),
            "-dBATCH".to_string(),
            format!("-sOutputFile={}", output.display()),
            input.display().to_string(),
        ];
        self.executor.run(&self.gs_bin, &args).await?;
        self.executor.expect_output(&self.gs_bin, output).await?;
        Ok(())
    }
}

#[async_trait]
impl ConversionStrategy for CompressPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::CompressPdf
    }

    fn tool(&self) -> Option<&str> {
        Some(&self.gs_bin)
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::CompressPdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for compress-pdf"));
        };

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}_compressed.pdf", request.base_stem()));
        request.progress.report(10);

        if self.probe.available(&self.gs_bin).await {
            match self
                .run_ghostscript(&input, &output, options.compression_level)
                .await
            {
                Ok(()) => {
                    if options.remove_metadata {
                        let target = output.clone();
                        tokio::task::spawn_blocking(move || strip_metadata_file(&target))
                            .await
                            .map_err(|e| {
                                AppError::with_source(
                                    ErrorKind::Internal,
                                    "Compress task panicked",
                                    e,
                                )
                            })??;
                    }
                    request.progress.report(90);
                    return Ok(ConvertOutcome::new(output));
                }
                Err(e) if e.kind == ErrorKind::ExternalTool => {
                    warn!(error = %e, "Ghostscript failed; using native compression");
                }
                Err(e) => return Err(e),
            }
        }

        let result_path = output.clone();
        tokio::task::spawn_blocking(move || compress_native(&input, &result_path, &options))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Compress task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

/// Native compression: metadata strip, JPEG image re-encoding at the
/// preset quality, and full stream recompression.
fn compress_native(input: &Path, output: &Path, options: &CompressOptions) -> AppResult<()> {
    let mut doc = pdf::load(input)?;

    if options.remove_metadata {
        strip_metadata(&mut doc);
    }
    recompress_images(&mut doc, options.compression_level);
    doc.compress();
    pdf::save(&mut doc, output)
}

fn strip_metadata_file(path: &Path) -> AppResult<()> {
    let mut doc = pdf::load(path)?;
    strip_metadata(&mut doc);
    pdf::save(&mut doc, path)
}

fn strip_metadata(doc: &mut Document) {
    doc.trailer.remove(b"Info");
    if let Ok(catalog_id) = doc.trailer.get(b"Root").and_then(Object::as_reference) {
        if let Ok(catalog) = doc.get_object_mut(catalog_id).and_then(Object::as_dict_mut) {
            catalog.remove(b"Metadata");
        }
    }
    doc.prune_objects();
}

/// JPEG quality per preset; `High` keeps images untouched so that output
/// sizes stay ordered low <= medium <= high.
fn jpeg_quality(level: CompressQuality) -> Option<u8> {
    match level {
        CompressQuality::Low => Some(40),
        CompressQuality::Medium => Some(70),
        CompressQuality::High => None,
    }
}

fn recompress_images(doc: &mut Document, level: CompressQuality) {
    let Some(quality) = jpeg_quality(level) else {
        return;
    };

    let image_ids: Vec<ObjectId> = doc
        .objects
        .iter()
        .filter_map(|(id, object)| {
            let stream = object.as_stream().ok()?;
            let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;
            if subtype != b"Image" {
                return None;
            }
            // Only plain DCTDecode streams hold raw JPEG bytes.
            let filter = stream.dict.get(b"Filter").ok()?.as_name().ok()?;
            (filter == b"DCTDecode").then_some(*id)
        })
        .collect();

    for id in image_ids {
        let Some(rebuilt) = reencode_jpeg(doc, id, quality) else {
            continue;
        };
        doc.objects.insert(id, rebuilt);
    }
}

/// Re-encode one embedded JPEG at the target quality. Returns `None` when
/// the stream cannot be decoded or the re-encode is not smaller.
fn reencode_jpeg(doc: &Document, id: ObjectId, quality: u8) -> Option<Object> {
    let stream = doc.get_object(id).ok()?.as_stream().ok()?;
    let img = image::load_from_memory(&stream.content).ok()?;
    let rgb = img.to_rgb8();

    let mut encoded = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut encoded, quality);
    encoder.encode_image(&rgb).ok()?;
    if encoded.len() >= stream.content.len() {
        return None;
    }

    let mut dict = stream.dict.clone();
    dict.set("ColorSpace", "DeviceRGB");
    dict.set("BitsPerComponent", 8i64);
    dict.remove(b"Decode");
    Some(Object::Stream(lopdf::Stream::new(dict, encoded)))
}
