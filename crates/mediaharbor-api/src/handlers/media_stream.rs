//! Media delivery by correlation id

use crate::error::{ErrorResponse, HttpAppError};
use crate::services::delivery;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
};
use mediaharbor_core::constants::AUDIO_STREAM_CONTENT_TYPE;
use mediaharbor_core::{AppError, MediaType};
use mediaharbor_storage::StorageError;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

fn range_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::RANGE).and_then(|v| v.to_str().ok())
}

/// Find the record of `media_type` with this correlation id and resolve its file on disk.
async fn resolve_media(
    state: &AppState,
    correlation_id: &str,
    media_type: MediaType,
) -> Result<PathBuf, AppError> {
    let not_found = || AppError::NotFound("Media not found".to_string());

    let correlation_id = Uuid::parse_str(correlation_id).map_err(|_| not_found())?;
    let record = state
        .store
        .find_by_correlation_id(correlation_id)
        .await?
        .filter(|record| record.media_type == media_type)
        .ok_or_else(not_found)?;

    let path = state.layout.resolve_public_path(&record.path)?;
    Ok(path)
}

#[utoipa::path(
    get,
    path = "/api/media/videos/stream/{correlation_id}",
    tag = "delivery",
    params(
        ("correlation_id" = Uuid, Path, description = "Correlation ID of the video"),
        ("Range" = Option<String>, Header, description = "Single byte range, e.g. bytes=0-1023")
    ),
    responses(
        (status = 200, description = "Whole playlist", content_type = "application/vnd.apple.mpegurl"),
        (status = 206, description = "Partial content"),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    )
)]
pub async fn stream_video(
    State(state): State<Arc<AppState>>,
    Path(correlation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let path = resolve_media(&state, &correlation_id, MediaType::Video).await?;
    let content_type = delivery::content_type_for(&path);
    Ok(delivery::stream_file(&path, &content_type, range_header(&headers)).await?)
}

#[utoipa::path(
    get,
    path = "/api/media/videos/stream/{correlation_id}/{file}",
    tag = "delivery",
    params(
        ("correlation_id" = Uuid, Path, description = "Correlation ID of the video"),
        ("file" = String, Path, description = "Playlist or segment name, e.g. index.m3u8"),
        ("Range" = Option<String>, Header, description = "Single byte range")
    ),
    responses(
        (status = 200, description = "HLS playlist or segment"),
        (status = 206, description = "Partial content"),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    )
)]
pub async fn stream_hls_asset(
    State(state): State<Arc<AppState>>,
    Path((correlation_id, file)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let path = state
        .layout
        .resolve_media_file(MediaType::Video, &format!("{}/{}", correlation_id, file))
        .map_err(|e| match e {
            StorageError::InvalidPath(_) => AppError::NotFound("File not found".to_string()),
            other => other.into(),
        })?;
    let content_type = delivery::content_type_for(&path);
    Ok(delivery::stream_file(&path, &content_type, range_header(&headers)).await?)
}

#[utoipa::path(
    get,
    path = "/api/media/images/serve/{correlation_id}",
    tag = "delivery",
    params(
        ("correlation_id" = Uuid, Path, description = "Correlation ID of the image")
    ),
    responses(
        (status = 200, description = "Image bytes"),
        (status = 404, description = "Image not found", body = ErrorResponse)
    )
)]
pub async fn serve_image(
    State(state): State<Arc<AppState>>,
    Path(correlation_id): Path<String>,
) -> Result<Response, HttpAppError> {
    let path = resolve_media(&state, &correlation_id, MediaType::Image).await?;
    Ok(delivery::serve_whole_file(&path).await?)
}

#[utoipa::path(
    get,
    path = "/api/media/audios/stream/{correlation_id}",
    tag = "delivery",
    params(
        ("correlation_id" = Uuid, Path, description = "Correlation ID of the audio"),
        ("Range" = Option<String>, Header, description = "Single byte range")
    ),
    responses(
        (status = 200, description = "Whole MP3", content_type = "audio/mpeg"),
        (status = 206, description = "Partial content", content_type = "audio/mpeg"),
        (status = 404, description = "Audio not found", body = ErrorResponse),
        (status = 416, description = "Range not satisfiable", body = ErrorResponse)
    )
)]
pub async fn stream_audio(
    State(state): State<Arc<AppState>>,
    Path(correlation_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let path = resolve_media(&state, &correlation_id, MediaType::Audio).await?;
    Ok(delivery::stream_file(&path, AUDIO_STREAM_CONTENT_TYPE, range_header(&headers)).await?)
}
