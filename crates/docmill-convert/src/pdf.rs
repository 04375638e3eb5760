//! Shared lopdf helpers used by the PDF strategies.

use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;

/// Page attributes the PDF spec lets a page inherit from its parents.
const INHERITED_PAGE_KEYS: [&[u8]; 4] = [b"MediaBox", b"Resources", b"CropBox", b"Rotate"];

/// Whether a file carries an encryption dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptionStatus {
    Clear,
    Encrypted,
}

/// Load a PDF, mapping failures into the application taxonomy.
///
/// Encrypted inputs surface as validation errors pointing at unlock; the
/// unlock strategy itself goes through [`encryption_status`] instead.
pub fn load(path: &Path) -> AppResult<Document> {
    if !path.exists() {
        return Err(AppError::not_found(format!(
            "Input file not found: {}",
            path.display()
        )));
    }
    match Document::load(path) {
        Ok(doc) => {
            if doc.trailer.has(b"Encrypt") {
                return Err(AppError::validation(
                    "PDF is password-protected; unlock it first",
                ));
            }
            Ok(doc)
        }
        Err(e) => {
            if sniff_encrypt_marker(path) {
                return Err(AppError::validation(
                    "PDF is password-protected; unlock it first",
                ));
            }
            Err(AppError::with_source(
                ErrorKind::Validation,
                format!("Not a valid PDF: {}", path.display()),
                e,
            ))
        }
    }
}

/// Save a PDF.
pub fn save(doc: &mut Document, path: &Path) -> AppResult<()> {
    doc.save(path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Io,
            format!("Failed to write PDF: {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// Determine whether a PDF is encrypted without requiring a full parse.
///
/// Parsers disagree on whether an encrypted file loads at all, so a parse
/// failure falls back to scanning for an `/Encrypt` trailer entry.
pub fn encryption_status(path: &Path) -> AppResult<EncryptionStatus> {
    if !path.exists() {
        return Err(AppError::not_found(format!(
            "Input file not found: {}",
            path.display()
        )));
    }
    match Document::load(path) {
        Ok(doc) if doc.trailer.has(b"Encrypt") => Ok(EncryptionStatus::Encrypted),
        Ok(_) => Ok(EncryptionStatus::Clear),
        Err(e) => {
            if sniff_encrypt_marker(path) {
                Ok(EncryptionStatus::Encrypted)
            } else {
                Err(AppError::with_source(
                    ErrorKind::Validation,
                    format!("Not a valid PDF: {}", path.display()),
                    e,
                ))
            }
        }
    }
}

/// A page attribute, own or inherited through the parent chain.
pub fn page_attr(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    if let Ok(value) = page.get(key) {
        return Some(value.clone());
    }
    find_inherited(doc, page, key)
}

/// Copy inheritable attributes from the parent chain onto the page itself.
///
/// Required before re-parenting pages (merge): a page that relied on its
/// old Pages node for MediaBox or Resources would lose them otherwise.
pub fn materialize_inherited(doc: &mut Document, page_id: ObjectId) {
    let mut found: Vec<(&[u8], Object)> = Vec::new();
    {
        let Ok(page) = doc.get_object(page_id).and_then(Object::as_dict) else {
            return;
        };
        for key in INHERITED_PAGE_KEYS {
            if page.has(key) {
                continue;
            }
            if let Some(value) = find_inherited(doc, page, key) {
                found.push((key, value));
            }
        }
    }
    if found.is_empty() {
        return;
    }
    if let Ok(page) = doc.get_object_mut(page_id).and_then(Object::as_dict_mut) {
        for (key, value) in found {
            page.set(key, value);
        }
    }
}

fn find_inherited(doc: &Document, start: &lopdf::Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent_ref = start.get(b"Parent").ok()?.as_reference().ok()?;
    // Parent chains in real files are a handful deep; cap against cycles.
    for _ in 0..64 {
        let parent = doc.get_object(parent_ref).ok()?.as_dict().ok()?;
        if let Ok(value) = parent.get(key) {
            return Some(value.clone());
        }
        parent_ref = parent.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn sniff_encrypt_marker(path: &Path) -> bool {
    let Ok(bytes) = std::fs::read(path) else {
        return false;
    };
    let needle = b"/Encrypt";
    bytes.windows(needle.len()).any(|window| window == needle)
}
