//! Staged uploads and transcode scratch output
//!
//! Uploads are written behind a [`TempPath`] and transcodes write into a
//! [`TempDir`] under the staging area. Both are removed when dropped, so every
//! early return of the upload pipeline leaves nothing behind. [`publish_dir`]
//! is the only way scratch output reaches a public directory.

use crate::error::{StorageError, StorageResult};
use crate::provision::{create_output_dir, ensure_dirs};
use mediaharbor_core::MediaType;
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir, TempPath};
use tokio::fs;
use uuid::Uuid;

/// A file accepted by upload intake and written to the staging area.
///
/// The staged file is deleted when this value is dropped. A missing file is ignored,
/// so the router may move it away first.
#[derive(Debug)]
pub struct StagedUpload {
    file: TempPath,
    /// Generated name: `<field>-<uuid><original extension>`
    pub filename: String,
    /// Filename as sent by the client
    pub original_name: String,
    pub content_type: String,
    pub media_type: MediaType,
    pub size: u64,
}

impl StagedUpload {
    pub fn new(
        file: TempPath,
        filename: String,
        original_name: String,
        content_type: String,
        media_type: MediaType,
        size: u64,
    ) -> Self {
        Self {
            file,
            filename,
            original_name,
            content_type,
            media_type,
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }
}

/// Create an empty scratch directory for one transcode inside `parent`.
pub async fn scratch_dir(parent: &Path, correlation_id: Uuid) -> StorageResult<TempDir> {
    ensure_dirs([parent]).await?;

    Builder::new()
        .prefix(&format!("{}-", correlation_id))
        .tempdir_in(parent)
        .map_err(|e| {
            tracing::error!(path = %parent.display(), error = %e, "Failed to create scratch directory");
            StorageError::Io(e)
        })
}

/// Move finished scratch output to `target` and return the final location.
///
/// `target` is reserved with an exclusive create first, so an existing output
/// directory is never reused or merged into. On failure the scratch output is removed.
pub async fn publish_dir(scratch: TempDir, target: &Path) -> StorageResult<PathBuf> {
    if let Err(e) = create_output_dir(target).await {
        discard_dir(scratch).await;
        return Err(e);
    }

    // rename(2) replaces the empty reservation
    if let Err(e) = fs::rename(scratch.path(), target).await {
        tracing::error!(
            from = %scratch.path().display(),
            to = %target.display(),
            error = %e,
            "Failed to publish output directory"
        );
        if let Err(e) = fs::remove_dir(target).await {
            tracing::warn!(path = %target.display(), error = %e, "Failed to release output directory");
        }
        discard_dir(scratch).await;
        return Err(StorageError::Io(e));
    }

    // Scratch path is gone now; disarm its cleanup
    let _ = scratch.keep();
    tracing::debug!(path = %target.display(), "Published output directory");
    Ok(target.to_path_buf())
}

/// Remove a scratch directory on the blocking pool.
pub async fn discard_dir(scratch: TempDir) {
    let path = scratch.path().to_path_buf();
    match tokio::task::spawn_blocking(move || scratch.close()).await {
        Ok(Ok(())) => {
            tracing::debug!(path = %path.display(), "Removed scratch directory");
        }
        Ok(Err(e)) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove scratch directory");
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Scratch cleanup task failed");
        }
    }
}
