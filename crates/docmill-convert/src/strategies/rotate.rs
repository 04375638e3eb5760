//! Page rotation.

use std::path::Path;

use async_trait::async_trait;
use lopdf::Object;
use tracing::warn;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, PageSelection, RotateOptions};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};

/// Rotates pages by a 90-degree multiple, composing with any rotation a
/// page already carries.
#[derive(Debug, Default)]
pub struct RotatePdf;

impl RotatePdf {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for RotatePdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::RotatePdf
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::RotatePdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for rotate-pdf"));
        };
        if options.rotation % 90 != 0 {
            return Err(AppError::validation(
                "Rotation must be a multiple of 90 degrees",
            ));
        }

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}_rotated.pdf", request.base_stem()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || rotate_file(&input, &result_path, &options))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Rotate task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

fn rotate_file(input: &Path, output: &Path, options: &RotateOptions) -> AppResult<()> {
    let mut doc = pdf::load(input)?;
    let pages = doc.get_pages();
    let total = pages.len() as u32;

    let targets: Vec<u32> = match &options.pages {
        PageSelection::All => (1..=total).collect(),
        PageSelection::List(list) => {
            let mut keep = Vec::new();
            for &page in list {
                if page == 0 || page > total {
                    warn!(page, total, "Skipping out-of-range page in rotation");
                } else {
                    keep.push(page);
                }
            }
            keep
        }
    };

    let delta = i64::from(options.rotation).rem_euclid(360);
    for page_number in targets {
        let Some(&page_id) = pages.get(&page_number) else {
            continue;
        };
        let current = pdf::page_attr(&doc, page_id, b"Rotate")
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(0);
        let next = (current + delta).rem_euclid(360);
        let page = doc
            .get_object_mut(page_id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Validation,
                    format!("Page {page_number} has no dictionary"),
                    e,
                )
            })?;
        page.set("Rotate", next);
    }

    pdf::save(&mut doc, output)
}
