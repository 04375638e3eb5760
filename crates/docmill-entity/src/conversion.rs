//! The conversion type matrix and conversion outcomes.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use docmill_core::AppError;

/// Every transformation the pipeline supports.
///
/// Serialized names are the public wire names (`"compress-pdf"` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionType {
    PdfToWord,
    WordToPdf,
    PdfToExcel,
    CompressPdf,
    MergePdf,
    SplitPdf,
    JpgToPdf,
    PdfToJpg,
    ImageToText,
    UnlockPdf,
    RotatePdf,
    ProtectPdf,
}

impl ConversionType {
    /// All supported conversion types, in display order.
    pub const ALL: [ConversionType; 12] = [
        Self::PdfToWord,
        Self::WordToPdf,
        Self::PdfToExcel,
        Self::CompressPdf,
        Self::MergePdf,
        Self::SplitPdf,
        Self::JpgToPdf,
        Self::PdfToJpg,
        Self::ImageToText,
        Self::UnlockPdf,
        Self::RotatePdf,
        Self::ProtectPdf,
    ];

    /// Return the wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfToWord => "pdf-to-word",
            Self::WordToPdf => "word-to-pdf",
            Self::PdfToExcel => "pdf-to-excel",
            Self::CompressPdf => "compress-pdf",
            Self::MergePdf => "merge-pdf",
            Self::SplitPdf => "split-pdf",
            Self::JpgToPdf => "jpg-to-pdf",
            Self::PdfToJpg => "pdf-to-jpg",
            Self::ImageToText => "image-to-text",
            Self::UnlockPdf => "unlock-pdf",
            Self::RotatePdf => "rotate-pdf",
            Self::ProtectPdf => "protect-pdf",
        }
    }

    /// Whether this conversion takes more than one input file.
    pub fn is_multi_input(&self) -> bool {
        matches!(self, Self::MergePdf)
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConversionType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| AppError::unsupported_conversion(format!("Unsupported conversion type: {s}")))
    }
}

/// The result of a successful conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOutcome {
    /// Path to the produced artifact.
    pub output_path: PathBuf,
    /// True when a fallback weaker than the requested guarantee was used
    /// (e.g. the protect marker fallback instead of real encryption).
    pub degraded: bool,
}

impl ConvertOutcome {
    /// A full-fidelity outcome.
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            degraded: false,
        }
    }

    /// An outcome produced by a degraded fallback path.
    pub fn degraded(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            degraded: true,
        }
    }

    /// File name component of the output path.
    pub fn file_name(&self) -> String {
        self.output_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
