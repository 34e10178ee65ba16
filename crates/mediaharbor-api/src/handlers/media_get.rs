use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use mediaharbor_core::{AppError, MediaRecord, Pagination};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Raw query values; anything non-numeric falls back to the defaults.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Page number, from 1 (default 1)
    pub page: Option<String>,
    /// Page size (default 10, max 100)
    pub limit: Option<String>,
}

impl ListQuery {
    pub fn pagination(&self) -> Pagination {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Pagination::new(parse(&self.page), parse(&self.limit))
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaListResponse {
    pub success: bool,
    pub message: String,
    pub media_files: Vec<MediaRecord>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MediaResponse {
    pub success: bool,
    pub media: MediaRecord,
}

#[utoipa::path(
    get,
    path = "/api/media",
    tag = "media",
    params(ListQuery),
    responses(
        (status = 200, description = "All media files, newest first", body = MediaListResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let pagination = query.pagination();
    let media_files = state.store.list_page(pagination).await?;

    tracing::debug!(
        page = pagination.page(),
        limit = pagination.limit(),
        count = media_files.len(),
        "Listed media"
    );

    Ok(Json(MediaListResponse {
        success: true,
        message: "All media files".to_string(),
        media_files,
    }))
}

#[utoipa::path(
    get,
    path = "/api/media/{id}",
    tag = "media",
    params(
        ("id" = Uuid, Path, description = "Media ID")
    ),
    responses(
        (status = 200, description = "Media found", body = MediaResponse),
        (status = 400, description = "Malformed media ID", body = ErrorResponse),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| AppError::InvalidInput("Invalid media id".to_string()))?;

    let media = state
        .store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Media not found".to_string()))?;

    Ok(Json(MediaResponse {
        success: true,
        media,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> ListQuery {
        ListQuery {
            page: page.map(String::from),
            limit: limit.map(String::from),
        }
    }

    #[test]
    fn test_pagination_from_query() {
        let p = query(Some("2"), Some("5")).pagination();
        assert_eq!((p.page(), p.limit(), p.offset()), (2, 5, 5));

        let p = query(Some("abc"), Some("")).pagination();
        assert_eq!((p.page(), p.limit()), (1, 10));

        let p = query(Some("-3"), Some("0")).pagination();
        assert_eq!((p.page(), p.limit()), (1, 1));

        let p = ListQuery::default().pagination();
        assert_eq!((p.page(), p.limit()), (1, 10));
    }
}
