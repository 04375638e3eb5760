//! Artifact download handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;

use docmill_core::error::AppError;
use docmill_storage::mime;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/download/{name}
///
/// Serves stored artifacts by bare file name. Anything carrying a path
/// component (`..`, separators) is rejected before the filesystem is
/// touched.
pub async fn download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let base = std::path::Path::new(&name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");
    if name.is_empty() || base != name || name.contains('\\') {
        return Err(AppError::validation("Invalid file name").into());
    }

    let (file, size) = state.storage.open_temp(&name).await?;
    let body = Body::from_stream(ReaderStream::new(file));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime::mime_for_path(&name))
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{name}\""),
        )
        .body(body)
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}
