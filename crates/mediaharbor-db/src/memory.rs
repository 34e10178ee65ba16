//! In-process [`MediaRecordStore`]

use async_trait::async_trait;
use chrono::Utc;
use mediaharbor_core::{AppError, MediaRecord, NewMediaRecord, Pagination};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;
use validator::Validate;

use crate::store::MediaRecordStore;

/// Keeps records in insertion order behind a lock. Mirrors the Postgres
/// repository's ordering and correlation id uniqueness.
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    records: Arc<RwLock<Vec<MediaRecord>>>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl MediaRecordStore for InMemoryMediaStore {
    async fn insert(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        record.validate()?;

        let mut records = self.records.write().await;
        if let Some(cid) = record.correlation_id {
            if records.iter().any(|r| r.correlation_id == Some(cid)) {
                return Err(AppError::Internal(format!(
                    "Duplicate correlation id {}",
                    cid
                )));
            }
        }

        // Strictly increasing timestamps keep newest-first ordering stable
        let mut now = Utc::now();
        if let Some(last) = records.last() {
            if now <= last.created_at {
                now = last.created_at + chrono::Duration::microseconds(1);
            }
        }

        let media = MediaRecord {
            id: Uuid::new_v4(),
            name: record.name,
            media_type: record.media_type,
            path: record.path,
            correlation_id: record.correlation_id,
            uploaded_at: now,
            created_at: now,
            updated_at: now,
        };
        records.push(media.clone());
        Ok(media)
    }

    async fn list_page(&self, pagination: Pagination) -> Result<Vec<MediaRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .rev()
            .skip(pagination.offset() as usize)
            .take(pagination.limit() as usize)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.id == id).cloned())
    }

    async fn find_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> Result<Option<MediaRecord>, AppError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.correlation_id == Some(correlation_id))
            .cloned())
    }
}
