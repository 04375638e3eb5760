//! PDF text extraction into a spreadsheet.

use std::path::Path;

use async_trait::async_trait;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::ConversionOptions;

use crate::office;
use crate::strategy::{ConversionStrategy, ConvertRequest};

/// Extracts PDF text into a minimal XLSX: one row per line, cells split
/// on tabs and runs of two or more spaces.
#[derive(Debug, Default)]
pub struct PdfToExcel;

impl PdfToExcel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for PdfToExcel {
    fn conversion(&self) -> ConversionType {
        ConversionType::PdfToExcel
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::PdfToExcel(_) = &request.options else {
            return Err(AppError::internal("Mismatched options for pdf-to-excel"));
        };

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}.xlsx", request.base_stem()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || extract_to_xlsx(&input, &result_path))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Extraction task panicked", e)
            })??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

fn extract_to_xlsx(input: &Path, output: &Path) -> AppResult<()> {
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

    let rows: Vec<Vec<String>> = text.lines().map(split_cells).collect();
    let bytes = office::xlsx_from_rows(&rows)?;
    std::fs::write(output, bytes)
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to write XLSX", e))
}

/// Split a text line into cells on tabs and runs of two or more spaces.
/// Single spaces stay inside a cell.
fn split_cells(line: &str) -> Vec<String> {
    line.replace('\t', "  ")
        .split("  ")
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use std::io::Read;

    #[test]
    fn splits_on_tabs_and_space_runs() {
        assert_eq!(split_cells("Name\tQty"), vec!["Name", "Qty"]);
        assert_eq!(split_cells("Total   12.50"), vec!["Total", "12.50"]);
        assert_eq!(split_cells("one value"), vec!["one value"]);
        assert_eq!(split_cells("a  b   c"), vec!["a", "b", "c"]);
        assert!(split_cells("   ").is_empty());
    }

    #[test]
    fn writes_a_loadable_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_pages(dir.path(), "table.pdf", &["Amount  12"]);
        let output = dir.path().join("table.xlsx");

        extract_to_xlsx(&input, &output).unwrap();

        let file = std::fs::File::open(&output).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .unwrap()
            .read_to_string(&mut sheet)
            .unwrap();
        assert!(sheet.contains("inlineStr"));
    }

    #[tokio::test]
    async fn strategy_names_output_after_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = testutil::pdf_with_pages(dir.path(), "ledger.pdf", &["a  b"]);

        let request = ConvertRequest::new(
            vec![input],
            "ledger.pdf",
            ConversionOptions::default_for(ConversionType::PdfToExcel).unwrap(),
            dir.path(),
        );
        let outcome = PdfToExcel::new().convert(&request).await.unwrap();
        assert_eq!(outcome.file_name(), "ledger.xlsx");
    }
}
