//! Image OCR via Tesseract.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::config::convert::ConvertConfig;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, OcrFormat};

use crate::strategy::{ConversionStrategy, ConvertRequest};
use crate::tool::{ToolExecutor, ToolProbe};

/// Recognizes text in an image. Plain-text output comes straight from
/// Tesseract; JSON output is rebuilt from its TSV with per-word
/// confidences and bounding boxes.
pub struct ImageToText {
    tesseract_bin: String,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
}

impl ImageToText {
    pub fn new(config: &ConvertConfig, executor: ToolExecutor, probe: Arc<ToolProbe>) -> Self {
        Self {
            tesseract_bin: config.tesseract_bin.clone(),
            executor,
            probe,
        }
    }
}

#[async_trait]
impl ConversionStrategy for ImageToText {
    fn conversion(&self) -> ConversionType {
        ConversionType::ImageToText
    }

    fn tool(&self) -> Option<&str> {
        Some(&self.tesseract_bin)
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::ImageToText(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for image-to-text"));
        };
        let language = options.language.trim();
        if language.is_empty() {
            return Err(AppError::validation("OCR language must not be empty"));
        }
        if !self.probe.available(&self.tesseract_bin).await {
            return Err(AppError::external_tool(
                "tesseract is required for image-to-text",
            ));
        }

        let input = request.input()?;
        let base = request.base_stem();
        // Tesseract appends the format extension to the output base itself.
        let out_base = request.output_dir.join(format!("{base}_ocr"));

        let mut args = vec![
            input.display().to_string(),
            out_base.display().to_string(),
            "-l".to_string(),
            language.to_string(),
        ];

        request.progress.report(10);
        match options.output_format {
            OcrFormat::Txt => {
                let output = out_base.with_extension("txt");
                self.executor.run(&self.tesseract_bin, &args).await?;
                self.executor
                    .expect_output(&self.tesseract_bin, &output)
                    .await?;
                request.progress.report(90);
                Ok(ConvertOutcome::new(output))
            }
            OcrFormat::Json => {
                args.push("tsv".to_string());
                self.executor.run(&self.tesseract_bin, &args).await?;
                request.progress.report(60);

                let tsv_path = out_base.with_extension("tsv");
                let tsv = tokio::fs::read_to_string(&tsv_path).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Io, "Failed to read Tesseract TSV output", e)
                })?;
                let report = parse_tsv(&tsv);
                request.progress.report(85);

                let output = out_base.with_extension("json");
                let json = serde_json::to_vec_pretty(&report)?;
                tokio::fs::write(&output, json).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Io, "Failed to write OCR report", e)
                })?;
                let _ = tokio::fs::remove_file(&tsv_path).await;
                request.progress.report(90);
                Ok(ConvertOutcome::new(output))
            }
        }
    }
}

/// Structured OCR result.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrReport {
    /// All recognized text, one line per recognized line.
    pub text: String,
    /// Mean word confidence, 0-100.
    pub confidence: f32,
    pub words: Vec<OcrWord>,
    pub lines: Vec<OcrLine>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
    pub bbox: OcrBox,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OcrBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f32,
}

/// Rebuild the structured report from Tesseract's TSV: level-5 rows are
/// words; lines group by (block, paragraph, line) in order.
fn parse_tsv(tsv: &str) -> OcrReport {
    let mut words: Vec<OcrWord> = Vec::new();
    let mut lines: Vec<OcrLine> = Vec::new();
    let mut current_key: Option<(u32, u32, u32)> = None;
    let mut current_words: Vec<(String, f32)> = Vec::new();

    fn flush(lines: &mut Vec<OcrLine>, current: &mut Vec<(String, f32)>) {
        if current.is_empty() {
            return;
        }
        let text = current
            .iter()
            .map(|(w, _)| w.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let confidence =
            current.iter().map(|(_, c)| c).sum::<f32>() / current.len() as f32;
        lines.push(OcrLine { text, confidence });
        current.clear();
    }

    for (index, row) in tsv.lines().enumerate() {
        if index == 0 {
            continue; // header
        }
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = cols[0].parse().unwrap_or(0);
        if level != 5 {
            continue;
        }
        let confidence: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if confidence < 0.0 || text.is_empty() {
            continue;
        }

        let key = (
            cols[2].parse().unwrap_or(0),
            cols[3].parse().unwrap_or(0),
            cols[4].parse().unwrap_or(0),
        );
        if current_key != Some(key) {
            flush(&mut lines, &mut current_words);
            current_key = Some(key);
        }

        let left: i32 = cols[6].parse().unwrap_or(0);
        let top: i32 = cols[7].parse().unwrap_or(0);
        let width: i32 = cols[8].parse().unwrap_or(0);
        let height: i32 = cols[9].parse().unwrap_or(0);

        current_words.push((text.to_string(), confidence));
        words.push(OcrWord {
            text: text.to_string(),
            confidence,
            bbox: OcrBox {
                x0: left,
                y0: top,
                x1: left + width,
                y1: top + height,
            },
        });
    }
    flush(&mut lines, &mut current_words);

    let text = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let confidence = if words.is_empty() {
        0.0
    } else {
        words.iter().map(|w| w.confidence).sum::<f32>() / words.len() as f32
    };

    OcrReport {
        text,
        confidence,
        words,
        lines,
    }
}
