use crate::error::{ErrorResponse, HttpAppError};
use crate::services::intake;
use crate::state::AppState;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use mediaharbor_core::{clean_media_name, MediaRecord, NewMediaRecord};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub media: MediaRecord,
}

/// Upload an image, audio or video file.
///
/// Images are stored as-is, audio is transcoded to MP3 and video to an HLS playlist.
#[utoipa::path(
    post,
    path = "/api/media/upload",
    tag = "media",
    request_body(content_type = "multipart/form-data", description = "Single file in the `mediaFile` field"),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "No file, unexpected field or unsupported file type", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Transcode or persistence failure", body = ErrorResponse)
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut multipart = multipart?;

    let staged = intake::receive_upload(
        &mut multipart,
        &state.layout,
        &state.intake.allowed_content_types,
    )
    .await?;

    let name = clean_media_name(&staged.original_name);
    let routed = state.media_router.route(staged).await?;

    if let Err(e) = state.layout.resolve_public_path(&routed.path) {
        tracing::error!(error = %e, path = %routed.path, "Routed path is outside the media layout");
        routed.discard().await;
        return Err(e.into());
    }

    let published = routed.publish().await?;

    let media = match state
        .store
        .insert(NewMediaRecord {
            name,
            media_type: published.media_type,
            path: published.path.clone(),
            correlation_id: Some(published.correlation_id),
        })
        .await
    {
        Ok(media) => media,
        Err(e) => {
            tracing::error!(error = %e, path = %published.path, "Failed to persist media record");
            published.unpublish().await;
            return Err(e.into());
        }
    };

    tracing::info!(
        media_id = %media.id,
        media_type = %media.media_type,
        correlation_id = ?media.correlation_id,
        "Media uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            media,
        }),
    ))
}
