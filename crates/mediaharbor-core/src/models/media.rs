use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Media category, derived from the top-level part of the declared MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "media_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Audio,
    Video,
}

impl MediaType {
    pub const ALL: [MediaType; 3] = [MediaType::Image, MediaType::Audio, MediaType::Video];

    /// Classify a MIME type such as `video/mp4` by its top-level category.
    pub fn from_mime(mime: &str) -> Result<Self, AppError> {
        let category = mime
            .split('/')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match category.as_str() {
            "image" => Ok(MediaType::Image),
            "audio" => Ok(MediaType::Audio),
            "video" => Ok(MediaType::Video),
            _ => Err(AppError::UnsupportedFileType(category)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
        }
    }

    /// Directory name used under the staging area for uploads of this category.
    pub fn staging_dir_name(&self) -> &'static str {
        match self {
            MediaType::Image => "images",
            MediaType::Audio => "audios",
            MediaType::Video => "videos",
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted metadata for one accepted upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    /// Public relative URL of the stored or derived asset
    pub path: String,
    pub correlation_id: Option<Uuid>,
    pub uploaded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to create a [`MediaRecord`]; timestamps and id come from the store.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct NewMediaRecord {
    #[validate(length(
        min = 1,
        max = 512,
        message = "Media name must be between 1 and 512 characters"
    ))]
    pub name: String,
    pub media_type: MediaType,
    #[validate(custom(function = "validate_public_path"))]
    pub path: String,
    pub correlation_id: Option<Uuid>,
}

fn validate_public_path(path: &str) -> Result<(), ValidationError> {
    if !path.starts_with('/') || path.len() < 2 {
        return Err(ValidationError::new("path_not_absolute")
            .with_message("Media path must be an absolute URL path".into()));
    }
    if path
        .split('/')
        .any(|segment| segment == ".." || segment == "." || segment.contains('\\'))
    {
        return Err(ValidationError::new("path_traversal")
            .with_message("Media path must not contain relative segments".into()));
    }
    Ok(())
}

/// Page selection for listings, always normalized to `page >= 1` and `1 <= limit <= MAX_PAGE_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    limit: i64,
}

impl Pagination {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        use crate::constants::{DEFAULT_PAGE, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
        Self {
            page: page.unwrap_or(DEFAULT_PAGE).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}
