//! File delivery: whole-file responses and single byte-range streaming

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use mediaharbor_core::constants::{HLS_PLAYLIST_CONTENT_TYPE, HLS_SEGMENT_CONTENT_TYPE};
use mediaharbor_core::AppError;
use std::io::{ErrorKind, SeekFrom};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Inclusive byte span of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn byte_count(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// How a request's `Range` header applies to a resource of known size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No header, or a header we do not understand: send the whole file
    Full,
    Partial(ByteRange),
    Unsatisfiable,
}

/// Resolve a `Range: bytes=...` header against `size`.
///
/// Only single ranges are honoured. `bytes=-N` selects the last N bytes and an
/// end past EOF is clamped. Multi-range and malformed headers fall back to
/// [`RangeOutcome::Full`].
pub fn resolve_range(header: Option<&str>, size: u64) -> RangeOutcome {
    let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if ranges.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((start, end)) = ranges.split_once('-') else {
        return RangeOutcome::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let Ok(suffix) = end.parse::<u64>() else {
            return RangeOutcome::Full;
        };
        if suffix == 0 || size == 0 {
            return RangeOutcome::Unsatisfiable;
        }
        return RangeOutcome::Partial(ByteRange {
            start: size.saturating_sub(suffix),
            end: size - 1,
        });
    }

    let Ok(start) = start.parse::<u64>() else {
        return RangeOutcome::Full;
    };
    let end = if end.is_empty() {
        None
    } else {
        match end.parse::<u64>() {
            Ok(end) => Some(end),
            Err(_) => return RangeOutcome::Full,
        }
    };

    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }
    let end = end.map_or(size - 1, |end| end.min(size - 1));
    if start > end {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(ByteRange { start, end })
}

/// Fixed content type of HLS playlists and segments.
pub fn hls_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "m3u8" => Some(HLS_PLAYLIST_CONTENT_TYPE),
        "ts" => Some(HLS_SEGMENT_CONTENT_TYPE),
        _ => None,
    }
}

/// Content type by extension.
pub fn content_type_for(path: &Path) -> String {
    match hls_content_type(path) {
        Some(content_type) => content_type.to_string(),
        None => mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string(),
    }
}

fn open_error(path: &Path, err: std::io::Error) -> AppError {
    if err.kind() == ErrorKind::NotFound {
        tracing::debug!(path = %path.display(), "Media file missing on disk");
        AppError::NotFound("File not found".to_string())
    } else {
        AppError::Io(err)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(value)
        .map_err(|e| AppError::Internal(format!("Invalid header value '{}': {}", value, e)))
}

fn build(builder: axum::http::response::Builder, body: Body) -> Result<Response, AppError> {
    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// Read a file completely and return it with a type inferred from its extension.
pub async fn serve_whole_file(path: &Path) -> Result<Response, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| open_error(path, e))?;

    build(
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, header_value(&content_type_for(path))?)
            .header(header::CONTENT_LENGTH, bytes.len()),
        Body::from(bytes),
    )
}

/// Stream a file, honouring a single `Range` request.
///
/// The open file is owned by the response body; it is closed when the body
/// finishes or the client goes away.
pub async fn stream_file(
    path: &Path,
    content_type: &str,
    range: Option<&str>,
) -> Result<Response, AppError> {
    let mut file = File::open(path).await.map_err(|e| open_error(path, e))?;
    let size = file.metadata().await?.len();

    let builder = Response::builder()
        .header(header::CONTENT_TYPE, header_value(content_type)?)
        .header(header::ACCEPT_RANGES, "bytes");

    match resolve_range(range, size) {
        RangeOutcome::Full => build(
            builder
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, size),
            Body::from_stream(ReaderStream::new(file)),
        ),
        RangeOutcome::Partial(span) => {
            file.seek(SeekFrom::Start(span.start)).await?;
            tracing::debug!(
                path = %path.display(),
                start = span.start,
                end = span.end,
                size,
                "Serving partial content"
            );
            build(
                builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_RANGE,
                        header_value(&format!("bytes {}-{}/{}", span.start, span.end, size))?,
                    )
                    .header(header::CONTENT_LENGTH, span.byte_count()),
                Body::from_stream(ReaderStream::new(file.take(span.byte_count()))),
            )
        }
        RangeOutcome::Unsatisfiable => Err(AppError::RangeNotSatisfiable { size }),
    }
}
