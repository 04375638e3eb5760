//! ZIP packaging for multi-file outputs and OOXML containers.

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use docmill_core::AppError;
use docmill_core::AppResult;
use docmill_core::error::ErrorKind;

/// Build a ZIP archive in memory from named entries.
pub fn zip_bytes(entries: &[(String, Vec<u8>)]) -> AppResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name, options).map_err(zip_err)?;
        writer
            .write_all(bytes)
            .map_err(|e| AppError::with_source(ErrorKind::Io, "Failed to write archive entry", e))?;
    }
    let cursor = writer.finish().map_err(zip_err)?;
    Ok(cursor.into_inner())
}

/// Write named entries into a ZIP file on disk.
pub fn write_zip(path: &Path, entries: &[(String, Vec<u8>)]) -> AppResult<()> {
    let bytes = zip_bytes(entries)?;
    std::fs::write(path, bytes).map_err(|e| {
        AppError::with_source(
            ErrorKind::Io,
            format!("Failed to write archive: {}", path.display()),
            e,
        )
    })
}

fn zip_err(e: zip::result::ZipError) -> AppError {
    AppError::with_source(ErrorKind::Internal, "Archive write failed", e)
}
