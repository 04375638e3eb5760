//! Conversion tool and concurrency configuration.

use serde::{Deserialize, Serialize};

/// Conversion pipeline configuration.
///
/// The `*_bin` fields name the external tools some strategies prefer.
/// Each binary is probed once per process; strategies fall back to their
/// native path (or fail with an external-tool error) when a probe fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Ghostscript binary, used for PDF compression presets.
    #[serde(default = "default_gs_bin")]
    pub gs_bin: String,
    /// qpdf binary, used for PDF encryption and decryption.
    #[serde(default = "default_qpdf_bin")]
    pub qpdf_bin: String,
    /// Tesseract binary, used for OCR.
    #[serde(default = "default_tesseract_bin")]
    pub tesseract_bin: String,
    /// pdftoppm binary, used for PDF page rasterization.
    #[serde(default = "default_pdftoppm_bin")]
    pub pdftoppm_bin: String,
    /// Upper bound in seconds for a single external tool invocation.
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_seconds: u64,
    /// Maximum number of conversions executing at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            gs_bin: default_gs_bin(),
            qpdf_bin: default_qpdf_bin(),
            tesseract_bin: default_tesseract_bin(),
            pdftoppm_bin: default_pdftoppm_bin(),
            tool_timeout_seconds: default_tool_timeout(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_gs_bin() -> String {
    "gs".to_string()
}

fn default_qpdf_bin() -> String {
    "qpdf".to_string()
}

fn default_tesseract_bin() -> String {
    "tesseract".to_string()
}

fn default_pdftoppm_bin() -> String {
    "pdftoppm".to_string()
}

fn default_tool_timeout() -> u64 {
    120
}

fn default_max_concurrent() -> usize {
    4
}
