//! Directory provisioning

use crate::error::{StorageError, StorageResult};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;

/// Ensure every directory exists, creating missing parents. Existing directories are left untouched.
pub async fn ensure_dirs<I, P>(dirs: I) -> StorageResult<()>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    for dir in dirs {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).await.map_err(|e| {
            tracing::error!(path = %dir.display(), error = %e, "Failed to create directory");
            StorageError::Io(e)
        })?;
    }
    Ok(())
}

/// Create a per-upload output directory, refusing to reuse one that already exists.
pub async fn create_output_dir(dir: &Path) -> StorageResult<()> {
    if let Some(parent) = dir.parent() {
        ensure_dirs([parent]).await?;
    }

    match fs::create_dir(dir).await {
        Ok(()) => {
            tracing::debug!(path = %dir.display(), "Created output directory");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::warn!(path = %dir.display(), "Output directory already exists");
            Err(StorageError::AlreadyExists(dir.display().to_string()))
        }
        Err(e) => Err(StorageError::Io(e)),
    }
}
