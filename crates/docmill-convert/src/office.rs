//! Minimal OOXML containers.
//!
//! Hand-built DOCX and XLSX packages: the smallest part structure Word,
//! Excel, and LibreOffice open without a repair prompt. Text goes in, a
//! well-formed package comes out; styling is out of scope.

use std::io::Read;
use std::path::Path;

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;

use crate::bundle;

const DOCX_CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
</Types>";

const DOCX_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

const XLSX_CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/worksheets/sheet1.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\
</Types>";

const XLSX_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
</Relationships>";

const XLSX_WORKBOOK: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>";

const XLSX_WORKBOOK_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet1.xml\"/>\
</Relationships>";

/// Build a DOCX with one paragraph per input line.
pub fn docx_from_text(text: &str) -> AppResult<Vec<u8>> {
    let mut body = String::new();
    for line in text.lines() {
        body.push_str("<w:p><w:r><w:t xml:space=\"preserve\">");
        body.push_str(&escape_xml(line));
        body.push_str("</w:t></w:r></w:p>");
    }
    if body.is_empty() {
        body.push_str("<w:p/>");
    }
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{body}</w:body></w:document>"
    );

    bundle::zip_bytes(&[
        ("[Content_Types].xml".to_string(), DOCX_CONTENT_TYPES.into()),
        ("_rels/.rels".to_string(), DOCX_RELS.into()),
        ("word/document.xml".to_string(), document.into_bytes()),
    ])
}

/// Build an XLSX with one row per input row, cells as inline strings.
pub fn xlsx_from_rows(rows: &[Vec<String>]) -> AppResult<Vec<u8>> {
    let mut sheet_rows = String::new();
    for (r, row) in rows.iter().enumerate() {
        if row.is_empty() {
            sheet_rows.push_str(&format!("<row r=\"{}\"/>", r + 1));
            continue;
        }
        sheet_rows.push_str(&format!("<row r=\"{}\">", r + 1));
        for (c, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_name(c), r + 1);
            sheet_rows.push_str(&format!(
                "<c r=\"{cell_ref}\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                escape_xml(cell)
            ));
        }
        sheet_rows.push_str("</row>");
    }
    let sheet = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
         <sheetData>{sheet_rows}</sheetData></worksheet>"
    );

    bundle::zip_bytes(&[
        ("[Content_Types].xml".to_string(), XLSX_CONTENT_TYPES.into()),
        ("_rels/.rels".to_string(), XLSX_RELS.into()),
        ("xl/workbook.xml".to_string(), XLSX_WORKBOOK.into()),
        (
            "xl/_rels/workbook.xml.rels".to_string(),
            XLSX_WORKBOOK_RELS.into(),
        ),
        ("xl/worksheets/sheet1.xml".to_string(), sheet.into_bytes()),
    ])
}

/// Extract the text of a DOCX: the character content of
/// `word/document.xml`, with paragraph boundaries as newlines.
pub fn docx_text(path: &Path) -> AppResult<String> {
    let file = std::fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::not_found(format!("Input file not found: {}", path.display()))
        } else {
            AppError::with_source(ErrorKind::Io, "Failed to open DOCX file", e)
        }
    })?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| AppError::with_source(ErrorKind::Validation, "Not a valid DOCX file", e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|_| AppError::validation("Not a DOCX file: word/document.xml is missing"))?
        .read_to_string(&mut xml)
        .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to read document.xml", e))?;
    Ok(document_text(&xml))
}

/// Pull visible text out of WordprocessingML without a full XML parser.
/// `<w:t>` runs are concatenated; `</w:p>` and `<w:br/>` become newlines.
fn document_text(xml: &str) -> String {
    let mut out = String::new();
    let mut rest = xml;
    let mut in_text = false;
    while let Some(open) = rest.find('<') {
        if in_text {
            out.push_str(&unescape_xml(&rest[..open]));
        }
        let Some(close) = rest[open..].find('>') else {
            break;
        };
        let tag = &rest[open + 1..open + close];
        if tag == "w:t" || tag.starts_with("w:t ") {
            in_text = true;
        } else if tag == "/w:t" {
            in_text = false;
        } else if tag == "/w:p" || tag == "w:br/" || tag.starts_with("w:br ") {
            out.push('\n');
        }
        rest = &rest[open + close + 1..];
    }
    out
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // XML 1.0 forbids most control characters.
            c if (c as u32) < 0x20 && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Spreadsheet column name for a zero-based index (A, B, ..., Z, AA).
fn column_name(mut index: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name
}
