//! Shared constants

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD_NAME: &str = "mediaFile";

/// MIME types accepted by upload intake unless `ALLOWED_CONTENT_TYPES` overrides them.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "audio/mpeg",
    "audio/wav",
    "video/mp4",
];

/// First path segments taken by API routes; static media aliases may not use them.
pub const RESERVED_ROUTE_PREFIXES: &[&str] = &["api", "docs", "health"];

/// Playlist written into every video output directory.
pub const HLS_PLAYLIST_NAME: &str = "index.m3u8";
pub const HLS_SEGMENT_PATTERN: &str = "segment%03d.ts";

pub const HLS_PLAYLIST_CONTENT_TYPE: &str = "application/vnd.apple.mpegurl";
pub const HLS_SEGMENT_CONTENT_TYPE: &str = "video/mp2t";
pub const AUDIO_STREAM_CONTENT_TYPE: &str = "audio/mpeg";

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;
