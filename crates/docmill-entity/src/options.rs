//! Per-conversion option records.
//!
//! [`ConversionOptions`] is a tagged union keyed by the conversion wire
//! name. Each variant carries its own typed record; unrecognized keys are
//! ignored and missing keys fall back to the documented defaults.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

use docmill_core::AppError;
use docmill_core::result::AppResult;

use crate::conversion::ConversionType;

/// Strongly-typed options for every supported conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConversionOptions {
    PdfToWord(PdfToWordOptions),
    WordToPdf(WordToPdfOptions),
    PdfToExcel(PdfToExcelOptions),
    CompressPdf(CompressOptions),
    MergePdf(MergeOptions),
    SplitPdf(SplitOptions),
    JpgToPdf(JpgToPdfOptions),
    PdfToJpg(PdfToJpgOptions),
    ImageToText(OcrOptions),
    UnlockPdf(UnlockOptions),
    RotatePdf(RotateOptions),
    ProtectPdf(ProtectOptions),
}

impl ConversionOptions {
    /// The conversion type this option record belongs to.
    pub fn kind(&self) -> ConversionType {
        match self {
            Self::PdfToWord(_) => ConversionType::PdfToWord,
            Self::WordToPdf(_) => ConversionType::WordToPdf,
            Self::PdfToExcel(_) => ConversionType::PdfToExcel,
            Self::CompressPdf(_) => ConversionType::CompressPdf,
            Self::MergePdf(_) => ConversionType::MergePdf,
            Self::SplitPdf(_) => ConversionType::SplitPdf,
            Self::JpgToPdf(_) => ConversionType::JpgToPdf,
            Self::PdfToJpg(_) => ConversionType::PdfToJpg,
            Self::ImageToText(_) => ConversionType::ImageToText,
            Self::UnlockPdf(_) => ConversionType::UnlockPdf,
            Self::RotatePdf(_) => ConversionType::RotatePdf,
            Self::ProtectPdf(_) => ConversionType::ProtectPdf,
        }
    }

    /// Build an option record from a wire type name and a raw options object.
    ///
    /// Unknown keys in `options` are ignored; a missing required key (for
    /// example `userPassword` on protect) is a validation error.
    pub fn from_parts(kind: ConversionType, options: serde_json::Value) -> AppResult<Self> {
        let mut map = match options {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            _ => return Err(AppError::validation("Conversion options must be a JSON object")),
        };
        map.insert(
            "type".to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );
        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| AppError::validation(format!("Invalid options for {kind}: {e}")))
    }

    /// The default option record for a conversion type.
    ///
    /// Fails for types with required options (protect needs a password).
    pub fn default_for(kind: ConversionType) -> AppResult<Self> {
        Self::from_parts(kind, serde_json::Value::Null)
    }
}

/// PDF text extraction into a Word document. No options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfToWordOptions {}

/// Word text extraction into a PDF. No options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordToPdfOptions {}

/// PDF text extraction into a spreadsheet. No options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfToExcelOptions {}

/// PDF concatenation. No options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeOptions {}

/// PDF compression options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompressOptions {
    /// Compression preset. Higher levels trade fidelity for size.
    pub compression_level: CompressQuality,
    /// Blank out document-information metadata.
    pub remove_metadata: bool,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            compression_level: CompressQuality::Medium,
            remove_metadata: true,
        }
    }
}

/// Compression preset. `Low` output is never larger than `Medium`, and
/// `Medium` never larger than `High`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressQuality {
    Low,
    #[default]
    Medium,
    High,
}

impl CompressQuality {
    /// Return the preset as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// PDF splitting options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SplitOptions {
    /// How to partition the pages.
    pub mode: SplitMode,
    /// Range expression for [`SplitMode::Range`], e.g. `"1-3,5,7-10"`.
    pub pages: Option<String>,
    /// Chunk size for [`SplitMode::Every`].
    pub every_n: Option<u32>,
}

/// Split partitioning mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// One output document per page.
    #[default]
    All,
    /// Output documents for the listed page ranges.
    Range,
    /// Output documents of N consecutive pages each.
    Every,
}

/// Image to PDF options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JpgToPdfOptions {
    /// JPEG re-encode quality (1-100).
    pub quality: u8,
    /// Scale the image to fit inside the page margins and center it.
    /// When false the image is drawn at its natural size from the origin.
    pub fit_to_page: bool,
    /// Named page size.
    pub page_size: PageSize,
}

impl Default for JpgToPdfOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            fit_to_page: false,
            page_size: PageSize::A4,
        }
    }
}

/// Named page sizes and their dimensions in PostScript points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Page dimensions as (width, height) in points.
    pub fn dimensions(&self) -> (f32, f32) {
        match self {
            Self::A4 => (595.0, 842.0),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
        }
    }
}

/// PDF rasterization options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfToJpgOptions {
    /// JPEG quality (1-100).
    pub quality: u8,
    /// Raster resolution in dots per inch.
    pub dpi: u32,
    /// Which pages to rasterize.
    pub pages: RasterPages,
}

impl Default for PdfToJpgOptions {
    fn default() -> Self {
        Self {
            quality: 90,
            dpi: 150,
            pages: RasterPages::All,
        }
    }
}

/// Page subset for rasterization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterPages {
    /// Every page.
    #[default]
    All,
    /// Only the first page.
    First,
}

/// OCR options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrOptions {
    /// Tesseract language code.
    pub language: String,
    /// Output format for the recognized text.
    pub output_format: OcrFormat,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            output_format: OcrFormat::Txt,
        }
    }
}

/// OCR output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrFormat {
    /// Plain extracted text.
    #[default]
    Txt,
    /// Structured JSON with per-word confidence and bounding boxes.
    Json,
}

/// PDF unlock options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnlockOptions {
    /// Password for documents that restrict opening.
    pub password: Option<String>,
}

/// PDF rotation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RotateOptions {
    /// Rotation delta in degrees. Must be a multiple of 90.
    pub rotation: i32,
    /// Pages to rotate.
    pub pages: PageSelection,
}

impl Default for RotateOptions {
    fn default() -> Self {
        Self {
            rotation: 90,
            pages: PageSelection::All,
        }
    }
}

/// Pages targeted by a rotation: the keyword `"all"` or an explicit list
/// of 1-based page numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    #[default]
    All,
    List(Vec<u32>),
}

impl Serialize for PageSelection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::List(pages) => pages.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PageSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SelectionVisitor;

        impl<'de> Visitor<'de> for SelectionVisitor {
            type Value = PageSelection;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"all\" or a list of 1-based page numbers")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<PageSelection, E> {
                if value.eq_ignore_ascii_case("all") {
                    Ok(PageSelection::All)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(value), &self))
                }
            }

            fn visit_seq<A: de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<PageSelection, A::Error> {
                let mut pages = Vec::new();
                while let Some(page) = seq.next_element::<u32>()? {
                    pages.push(page);
                }
                Ok(PageSelection::List(pages))
            }
        }

        deserializer.deserialize_any(SelectionVisitor)
    }
}

/// PDF protection options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectOptions {
    /// Password required to open the document.
    pub user_password: String,
    /// Password for changing permissions. Defaults to the user password.
    #[serde(default)]
    pub owner_password: Option<String>,
    /// Permission set enforced by the encryption.
    #[serde(default)]
    pub permissions: ProtectPermissions,
}

/// Permissions applied when protecting a PDF. Defaults allow everything,
/// matching qpdf's behavior when no restriction flags are passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProtectPermissions {
    /// Allowed print fidelity.
    pub printing: PrintLevel,
    /// Allow document modification.
    pub modifying: bool,
    /// Allow text and image extraction.
    pub copying: bool,
    /// Allow adding annotations.
    pub annotating: bool,
}

impl Default for ProtectPermissions {
    fn default() -> Self {
        Self {
            printing: PrintLevel::Full,
            modifying: true,
            copying: true,
            annotating: true,
        }
    }
}

/// Print permission level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintLevel {
    /// Printing forbidden.
    None,
    /// Low-resolution printing only.
    Low,
    /// Unrestricted printing.
    #[default]
    Full,
}

impl PrintLevel {
    /// Return the level as a lowercase string (matches qpdf's `--print`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Full => "full",
        }
    }
}
