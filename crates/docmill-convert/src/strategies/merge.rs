//! PDF concatenation.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use lopdf::{Dictionary, Document, Object, ObjectId};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;
use docmill_entity::conversion::{ConversionType, ConvertOutcome};

use crate::pdf;
use crate::strategy::{ConversionStrategy, ConvertRequest};

/// Concatenates two or more PDFs in argument order.
#[derive(Debug, Default)]
pub struct MergePdf;

impl MergePdf {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ConversionStrategy for MergePdf {
    fn conversion(&self) -> ConversionType {
        ConversionType::MergePdf
    }

    async fn convert(&self, request: &ConvertRequest) -> AppResult<ConvertOutcome> {
        if request.inputs.len() < 2 {
            return Err(AppError::validation("Merge requires at least 2 input files"));
        }

        let inputs = request.inputs.clone();
        let output = request
            .output_dir
            .join(format!("merged_{}.pdf", Utc::now().timestamp_millis()));

        request.progress.report(10);
        let result_path = output.clone();
        tokio::task::spawn_blocking(move || merge_files(&inputs, &result_path))
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Internal, "Merge task panicked", e))??;
        request.progress.report(90);

        Ok(ConvertOutcome::new(output))
    }
}

fn merge_files(inputs: &[PathBuf], output: &Path) -> AppResult<()> {
    let mut documents = Vec::with_capacity(inputs.len());
    for path in inputs {
        documents.push(pdf::load(path)?);
    }
    let mut merged = merge_documents(documents)?;
    pdf::save(&mut merged, output)
}

/// Stitch the documents into one, renumbering objects and rebuilding a
/// single catalog and page tree. Pages keep their source order.
fn merge_documents(documents: Vec<Document>) -> AppResult<Document> {
    let mut merged = Document::with_version("1.5");
    let mut max_id = 1u32;
    let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
    let mut catalog: Option<(ObjectId, Dictionary)> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        // Pages are about to be re-parented; pin down anything they
        // inherited from their old Pages nodes first.
        for &page_id in &page_ids {
            pdf::materialize_inherited(&mut doc, page_id);
        }

        let mut objects = std::mem::take(&mut doc.objects);
        for id in &page_ids {
            if let Some(object) = objects.remove(id) {
                page_objects.push((*id, object));
            }
        }

        for (object_id, object) in objects {
            let type_name = object
                .as_dict()
                .ok()
                .and_then(|d| d.get(b"Type").ok())
                .and_then(|t| t.as_name().ok());
            match type_name {
                Some(b"Catalog") => {
                    if catalog.is_none() {
                        if let Ok(dict) = object.as_dict() {
                            catalog = Some((object_id, dict.clone()));
                        }
                    }
                }
                Some(b"Pages") => {
                    if let Ok(dict) = object.as_dict() {
                        match &mut pages_root {
                            Some((_, existing)) => {
                                for (key, value) in dict.iter() {
                                    existing.set(key.clone(), value.clone());
                                }
                            }
                            None => pages_root = Some((object_id, dict.clone())),
                        }
                    }
                }
                // Navigation trees reference pages across documents and are
                // not rebuilt; drop them.
                Some(b"Outlines") => {}
                _ => {
                    merged.objects.insert(object_id, object);
                }
            }
        }
    }

    let (catalog_id, mut catalog_dict) =
        catalog.ok_or_else(|| AppError::validation("No catalog found in input PDFs"))?;
    let (pages_id, mut pages_dict) =
        pages_root.ok_or_else(|| AppError::validation("No page tree found in input PDFs"))?;

    let kids: Vec<Object> = page_objects
        .iter()
        .map(|(id, _)| Object::Reference(*id))
        .collect();

    for (object_id, mut object) in page_objects {
        if let Ok(dict) = object.as_dict_mut() {
            dict.set("Parent", Object::Reference(pages_id));
        }
        merged.objects.insert(object_id, object);
    }

    pages_dict.set("Count", kids.len() as i64);
    pages_dict.set("Kids", kids);
    pages_dict.remove(b"Parent");
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    catalog_dict.set("Pages", Object::Reference(pages_id));
    catalog_dict.remove(b"Outlines");
    merged
        .objects
        .insert(catalog_id, Object::Dictionary(catalog_dict));

    merged.trailer.set("Root", Object::Reference(catalog_id));
    merged.max_id = max_id;
    merged.renumber_objects();
    merged.compress();
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use docmill_entity::options::{ConversionOptions, MergeOptions};

    #[test]
    fn merges_pages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = testutil::pdf_with_pages(dir.path(), "a.pdf", &["a1", "a2"]);
        let second = testutil::pdf_with_pages(dir.path(), "b.pdf", &["b1", "b2", "b3"]);
        let output = dir.path().join("merged.pdf");

        merge_files(&[first, second], &output).unwrap();

        let doc = Document::load(&output).unwrap();
        assert_eq!(doc.get_pages().len(), 5);
    }

    #[test]
    fn merged_pages_keep_inherited_attributes() {
        let dir = tempfile::tempdir().unwrap();
        let first = testutil::pdf_with_inherited_mediabox(dir.path(), "inherit.pdf");
        let second = testutil::pdf_with_pages(dir.path(), "plain.pdf", &["x"]);
        let output = dir.path().join("merged.pdf");

        merge_files(&[first, second], &output).unwrap();

        let doc = Document::load(&output).unwrap();
        for (_, page_id) in doc.get_pages() {
            let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
            assert!(page.has(b"MediaBox"), "page lost its MediaBox");
        }
    }

    #[test]
    fn rejects_invalid_member() {
        let dir = tempfile::tempdir().unwrap();
        let good = testutil::pdf_with_pages(dir.path(), "good.pdf", &["a"]);
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"nope").unwrap();

        let err = merge_files(&[good, bad], &dir.path().join("out.pdf")).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn strategy_requires_two_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let only = testutil::pdf_with_pages(dir.path(), "one.pdf", &["a"]);

        let request = ConvertRequest::new(
            vec![only],
            "one.pdf",
            ConversionOptions::MergePdf(MergeOptions::default()),
            dir.path(),
        );
        let err = MergePdf::new().convert(&request).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn strategy_produces_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let first = testutil::pdf_with_pages(dir.path(), "a.pdf", &["a"]);
        let second = testutil::pdf_with_pages(dir.path(), "b.pdf", &["b"]);

        let request = ConvertRequest::new(
            vec![first, second],
            "a.pdf",
            ConversionOptions::MergePdf(MergeOptions::default()),
            dir.path(),
        );
        let outcome = MergePdf::new().convert(&request).await.unwrap();
        let name = outcome.file_name();
        assert!(name.starts_with("merged_") && name.ends_with(".pdf"));
        assert!(outcome.output_path.exists());
    }
}
