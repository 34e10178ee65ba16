use async_trait::async_trait;
use mediaharbor_core::{AppError, MediaRecord, NewMediaRecord, Pagination};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;
use validator::Validate;

use crate::store::MediaRecordStore;

const MEDIA_COLUMNS: &str =
    "id, name, media_type, path, correlation_id, uploaded_at, created_at, updated_at";

/// Postgres-backed media record repository
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MediaRecordStore for MediaRepository {
    #[tracing::instrument(skip(self, record), fields(db.table = "media", db.operation = "insert", media_type = %record.media_type))]
    async fn insert(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        record.validate()?;

        let media = sqlx::query_as::<Postgres, MediaRecord>(&format!(
            r#"
            INSERT INTO media (name, media_type, path, correlation_id)
            VALUES ($1, $2, $3, $4)
            RETURNING {MEDIA_COLUMNS}
            "#
        ))
        .bind(&record.name)
        .bind(record.media_type)
        .bind(&record.path)
        .bind(record.correlation_id)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(media_id = %media.id, "Media record inserted");
        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list_page(&self, pagination: Pagination) -> Result<Vec<MediaRecord>, AppError> {
        let media = sqlx::query_as::<Postgres, MediaRecord>(&format!(
            r#"
            SELECT {MEDIA_COLUMNS}
            FROM media
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let media = sqlx::query_as::<Postgres, MediaRecord>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", correlation_id = %correlation_id))]
    async fn find_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> Result<Option<MediaRecord>, AppError> {
        let media = sqlx::query_as::<Postgres, MediaRecord>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE correlation_id = $1"
        ))
        .bind(correlation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(media)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
