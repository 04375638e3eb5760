//! Image to PDF.

use std::path::Path;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::{ConversionOptions, JpgToPdfOptions};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};

/// Margin around a fitted image, in points.
const FIT_MARGIN: f32 = 40.0;

/// Embeds a raster image (JPEG, PNG, GIF, WebP) as a one-page PDF.
#[derive(Debug, Default)]
pub struct JpgToPdf;

impl JpgToPdf {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for JpgToPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::JpgToPdf
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::JpgToPdf(options) = request.options.clone() else {
            return Err(AppError::internal("Mismatched options for jpg-to-pdf"));
        };

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}.pdf", request.base_stem()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || image_to_pdf(&input, &result_path, &options))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Image embed task panicked", e)
            })??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

/// Placement of the image on the page, in points.
#[derive(Debug, PartialEq)]
struct Placement {
    width: f32,
    height: f32,
    x: f32,
    y: f32,
}

/// Fit-to-page scales into the margin box and centers; otherwise the
/// image is drawn at its natural pixel size from the page origin.
fn place_image(image_w: f32, image_h: f32, page_w: f32, page_h: f32, fit: bool) -> Placement {
    if !fit {
        return Placement {
            width: image_w,
            height: image_h,
            x: 0.0,
            y: 0.0,
        };
    }
    let avail_w = page_w - 2.0 * FIT_MARGIN;
    let avail_h = page_h - 2.0 * FIT_MARGIN;
    let scale = (avail_w / image_w).min(avail_h / image_h);
    let width = image_w * scale;
    let height = image_h * scale;
    Placement {
        width,
        height,
        x: (page_w - width) / 2.0,
        y: (page_h - height) / 2.0,
    }
}

fn image_to_pdf(input: &Path, output: &Path, options: &JpgToPdfOptions) -> AppResult<()> {
    let img = image::open(input)
        .map_err(|e| AppError::with_source(ErrorKind::Validation, "Could not decode image", e))?;
    let rgb = img.to_rgb8();
    let (page_w, page_h) = options.page_size.dimensions();
    let placement = place_image(
        rgb.width() as f32,
        rgb.height() as f32,
        page_w,
        page_h,
        options.fit_to_page,
    );

    // Re-encode as baseline JPEG so it embeds as a DCTDecode stream.
    let mut jpeg = Vec::new();
    let quality = options.quality.clamp(1, 100);
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "JPEG encode failed", e))?;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => rgb.width() as i64,
            "Height" => rgb.height() as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "DCTDecode",
        },
        jpeg,
    ));

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    Object::Real(placement.width),
                    0.into(),
                    0.into(),
                    Object::Real(placement.height),
                    Object::Real(placement.x),
                    Object::Real(placement.y),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content
        .encode()
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Failed to encode page content", e))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
    });
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), Object::Real(page_w), Object::Real(page_h)],
        "Contents" => Object::Reference(content_id),
        "Resources" => Object::Reference(resources_id),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();
    pdf::save(&mut doc, output)
}
