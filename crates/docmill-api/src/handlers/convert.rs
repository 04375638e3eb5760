//! Conversion submission handler.

use axum::Json;
use axum::extract::{Multipart, State};
use bytes::Bytes;
use tracing::info;

use docmill_convert::ConvertRequest;
use docmill_core::error::AppError;
use docmill_entity::conversion::ConversionType;
use docmill_entity::options::ConversionOptions;

use crate::dto::ConvertResponse;
use crate::error::ApiError;
use crate::extract::RequestIdentity;
use crate::state::AppState;

/// POST /api/convert
///
/// Multipart form: one or more `file` fields, a `type` field naming the
/// conversion, an optional `options` JSON object. The whole admission
/// chain — input validation, per-tier size cap, IP throttle, usage gate —
/// runs before anything is persisted, so a rejected request consumes no
/// quota and leaves no files behind.
pub async fn convert(
    State(state): State<AppState>,
    caller: RequestIdentity,
    mut multipart: Multipart,
) -> Result<Json<ConvertResponse>, ApiError> {
    let mut files: Vec<(String, Bytes)> = Vec::new();
    let mut type_name: Option<String> = None;
    let mut options_json: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" | "files" => {
                let file_name = field
                    .file_name()
                    .map(String::from)
                    .unwrap_or_else(|| "upload".to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::validation(format!("Read error: {e}")))?;
                files.push((file_name, data));
            }
            "type" => {
                type_name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "options" => {
                options_json = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let type_name = type_name.ok_or_else(|| AppError::validation("Missing conversion type"))?;
    let conversion: ConversionType = type_name.parse()?;

    if files.is_empty() {
        return Err(AppError::validation("No input file provided").into());
    }
    if conversion.is_multi_input() {
        if files.len() < 2 {
            return Err(AppError::validation("Merge requires at least 2 input files").into());
        }
    } else if files.len() > 1 {
        return Err(
            AppError::validation(format!("{conversion} takes exactly one input file")).into(),
        );
    }

    let max_size = caller.tier.max_file_size(&state.config.gate);
    for (file_name, data) in &files {
        if data.len() as u64 > max_size {
            return Err(AppError::validation(format!(
                "File '{file_name}' exceeds the {} MB limit for the {} tier",
                max_size / (1024 * 1024),
                caller.tier,
            ))
            .into());
        }
    }

    let options = match options_json {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(&raw)
                .map_err(|e| AppError::validation(format!("Invalid options JSON: {e}")))?;
            ConversionOptions::from_parts(conversion, value)?
        }
        None => ConversionOptions::default_for(conversion)?,
    };

    if !state.throttle.check(caller.ip).await? {
        return Err(AppError::quota_exceeded(
            "Too many requests from this address. Try again later.",
        )
        .into());
    }

    let decision = state
        .gate
        .check_and_increment(&caller.identity, caller.tier)
        .await?;
    if !decision.allowed {
        let message = decision
            .message
            .unwrap_or_else(|| "Daily conversion limit reached".to_string());
        return Err(AppError::quota_exceeded(message).into());
    }

    let original_name = files[0].0.clone();
    let mut stored = Vec::with_capacity(files.len());
    let mut inputs = Vec::with_capacity(files.len());
    for (file_name, data) in files {
        let upload = state.storage.save_upload(&file_name, data).await?;
        inputs.push(upload.path.clone());
        stored.push(upload);
    }

    info!(
        conversion = %conversion,
        identity = %caller.identity,
        inputs = inputs.len(),
        remaining = decision.remaining,
        "Conversion accepted"
    );

    let request = ConvertRequest::new(inputs, original_name, options, state.storage.temp_dir());
    let result = state.dispatcher.dispatch(request).await;

    // Inputs are one-shot whatever the outcome.
    for upload in &stored {
        state.storage.delete_quiet(&upload.path).await;
    }
    let outcome = result?;

    let output_file = outcome.file_name();
    let size = state.storage.file_size(&outcome.output_path).await?;

    Ok(Json(ConvertResponse {
        success: true,
        output_file: output_file.clone(),
        download_url: format!("/api/download/{output_file}"),
        size,
        degraded: outcome.degraded,
    }))
}
