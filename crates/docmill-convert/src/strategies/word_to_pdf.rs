//! DOCX to PDF.

use std::path::Path;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};
use docmill_entity::options::ConversionOptions;

use crate::office;
use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};

const PAGE_W: f32 = 595.0;
const PAGE_H: f32 = 842.0;
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 12.0;
// 12pt at 1.2 line height.
const LEADING: f32 = 14.4;
// Helvetica averages about half an em per character at the body size.
const MAX_CHARS: usize = 82;

/// Renders DOCX text onto A4 pages: 12pt Helvetica, 50pt margins,
/// word-wrapped. Formatting does not survive; the text does.
#[derive(Debug, Default)]
pub struct WordToPdf;

impl WordToPdf {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for WordToPdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::WordToPdf
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        let ConversionOptions::WordToPdf(_) = &request.options else {
            return Err(AppError::internal("Mismatched options for word-to-pdf"));
        };

        let input = request.input()?.to_path_buf();
        let output = request
            .output_dir
            .join(format!("{}.pdf", request.base_stem()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || {
            let text = office::docx_text(&input)?;
            text_to_pdf(&text, &result_path)
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Render task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

/// Greedy word wrap against a character budget. Blank lines survive;
/// words longer than the budget are hard-split.
fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let mut wrapped = Vec::new();
    let mut current = String::new();
    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();
        if current.is_empty() {
            if word_len <= max_chars {
                current.push_str(word);
            } else {
                hard_split(word, max_chars, &mut wrapped, &mut current);
            }
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
        } else {
            wrapped.push(std::mem::take(&mut current));
            if word_len <= max_chars {
                current.push_str(word);
            } else {
                hard_split(word, max_chars, &mut wrapped, &mut current);
            }
        }
    }
    if !current.is_empty() || wrapped.is_empty() {
        wrapped.push(current);
    }
    wrapped
}

fn hard_split(word: &str, max_chars: usize, wrapped: &mut Vec<String>, current: &mut String) {
    let chars: Vec<char> = word.chars().collect();
    for chunk in chars.chunks(max_chars) {
        let piece: String = chunk.iter().collect();
        if chunk.len() == max_chars {
            wrapped.push(piece);
        } else {
            *current = piece;
        }
    }
}

fn text_to_pdf(text: &str, output: &Path) -> AppResult<()> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        lines.extend(wrap_line(raw, MAX_CHARS));
    }
    if lines.is_empty() {
        lines.push(String::new());
    }

    let lines_per_page = (((PAGE_H - 2.0 * MARGIN - FONT_SIZE) / LEADING) as usize) + 1;

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(lines_per_page) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Real(FONT_SIZE)]),
            Operation::new("TL", vec![Object::Real(LEADING)]),
            Operation::new(
                "Td",
                vec![
                    Object::Real(MARGIN),
                    Object::Real(PAGE_H - MARGIN - FONT_SIZE),
                ],
            ),
        ];
        for (index, line) in chunk.iter().enumerate() {
            if index > 0 {
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(line.as_str())]));
        }
        operations.push(Operation::new("ET", vec![]));

        let encoded = Content { operations }.encode().map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to encode page content", e)
        })?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(PAGE_W), Object::Real(PAGE_H)],
            "Contents" => Object::Reference(content_id),
            "Resources" => Object::Reference(resources_id),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
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
