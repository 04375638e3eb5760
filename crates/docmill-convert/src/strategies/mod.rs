//! The conversion strategy set.

pub mod compress;
pub mod jpg_to_pdf;
pub mod merge;
pub mod ocr;
pub mod pdf_to_excel;
pub mod pdf_to_jpg;
pub mod pdf_to_word;
pub mod protect;
pub mod rotate;
pub mod split;
pub mod unlock;
pub mod word_to_pdf;

use std::sync::Arc;

use docmill_core::config::convert::ConvertConfig;

use crate::strategy::ConversionStrategy;
use crate::tool::{ToolExecutor, ToolProbe};

/// Instantiate every strategy in the conversion matrix.
pub fn all(
    config: &ConvertConfig,
    executor: ToolExecutor,
    probe: Arc<ToolProbe>,
) -> Vec<Arc<dyn ConversionStrategy>> {
    vec![
        Arc::new(pdf_to_word::PdfToWord::new()),
        Arc::new(word_to_pdf::WordToPdf::new()),
        Arc::new(pdf_to_excel::PdfToExcel::new()),
        Arc::new(compress::CompressPdf::new(
            config,
            executor.clone(),
            probe.clone(),
        )),
        Arc::new(merge::MergePdf::new()),
        Arc::new(split::SplitPdf::new()),
        Arc::new(jpg_to_pdf::JpgToPdf::new()),
        Arc::new(pdf_to_jpg::PdfToJpg::new(
            config,
            executor.clone(),
            probe.clone(),
        )),
        Arc::new(ocr::ImageToText::new(
            config,
            executor.clone(),
            probe.clone(),
        )),
        Arc::new(unlock::UnlockPdf::new(
            config,
            executor.clone(),
            probe.clone(),
        )),
        Arc::new(rotate::RotatePdf::new()),
        Arc::new(protect::ProtectPdf::new(config, executor, probe)),
    ]
}
