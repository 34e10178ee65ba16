use async_trait::async_trait;
use mediaharbor_core::{AppError, MediaRecord, NewMediaRecord, Pagination};
use uuid::Uuid;

/// Persistence operations for media records.
///
/// Records are immutable once inserted; there is no update or delete.
#[async_trait]
pub trait MediaRecordStore: Send + Sync {
    /// Persist a new record. Id and timestamps are assigned by the store.
    async fn insert(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError>;

    /// One page of records, newest first.
    async fn list_page(&self, pagination: Pagination) -> Result<Vec<MediaRecord>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<MediaRecord>, AppError>;

    async fn find_by_correlation_id(
        &self,
        correlation_id: Uuid,
    ) -> Result<Option<MediaRecord>, AppError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}
