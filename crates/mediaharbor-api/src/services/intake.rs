//! Upload intake: accept one multipart file and stage it on disk

use crate::error::multipart_error;
use axum::extract::multipart::{Field, Multipart};
use mediaharbor_core::constants::UPLOAD_FIELD_NAME;
use mediaharbor_core::{AppError, MediaType};
use mediaharbor_storage::{ensure_dirs, MediaLayout, StagedUpload};
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Strip MIME parameters (`video/mp4; codecs=...` -> `video/mp4`) and lowercase.
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase()
}

/// `mediaFile-<uuid><.ext>`, keeping the client's extension when it is plain alphanumeric.
pub fn staged_file_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 16 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_default();
    format!("{}-{}{}", UPLOAD_FIELD_NAME, Uuid::new_v4(), extension)
}

/// Read the multipart body and stage its single file.
///
/// Text fields are ignored. A file under any field other than `mediaFile`, or a
/// second file, is rejected.
pub async fn receive_upload(
    multipart: &mut Multipart,
    layout: &MediaLayout,
    allowed_content_types: &[String],
) -> Result<StagedUpload, AppError> {
    let mut staged: Option<StagedUpload> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.file_name().is_none() {
            continue;
        }

        let field_name = field.name().unwrap_or_default();
        if field_name != UPLOAD_FIELD_NAME || staged.is_some() {
            tracing::debug!(field = %field_name, "Rejecting unexpected file field");
            return Err(AppError::BadRequest("Unexpected field".to_string()));
        }

        staged = Some(stage_field(field, layout, allowed_content_types).await?);
    }

    staged.ok_or(AppError::NoFileProvided)
}

async fn stage_field(
    mut field: Field<'_>,
    layout: &MediaLayout,
    allowed_content_types: &[String],
) -> Result<StagedUpload, AppError> {
    let content_type = field
        .content_type()
        .map(normalize_mime_type)
        .ok_or_else(|| AppError::UnsupportedMediaType("missing content type".to_string()))?;

    if !allowed_content_types.iter().any(|ct| ct == &content_type) {
        return Err(AppError::UnsupportedMediaType(content_type));
    }
    let media_type = MediaType::from_mime(&content_type)?;

    let original_name = field.file_name().unwrap_or_default().to_string();
    let filename = staged_file_name(&original_name);

    let dir = layout.staging_root(media_type);
    ensure_dirs([&dir]).await?;
    let path = dir.join(&filename);

    // Removes the partial file if the stream breaks or a write fails
    let staged_file = TempPath::from_path(&path);
    let mut file = tokio::fs::File::create(&path).await?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::info!(
        original_name = %original_name,
        content_type = %content_type,
        media_type = %media_type,
        size_bytes = size,
        "Upload staged"
    );

    Ok(StagedUpload::new(
        staged_file,
        filename,
        original_name,
        content_type,
        media_type,
        size,
    ))
}
