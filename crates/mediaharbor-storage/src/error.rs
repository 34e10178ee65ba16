use mediaharbor_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage path: {0}")]
    InvalidPath(String),

    #[error("Directory already exists: {0}")]
    AlreadyExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidPath(path) => {
                AppError::Internal(format!("Media path does not resolve under the upload root: {}", path))
            }
            StorageError::AlreadyExists(path) => {
                AppError::Internal(format!("Output directory already in use: {}", path))
            }
            StorageError::Io(e) => AppError::Io(e),
        }
    }
}
