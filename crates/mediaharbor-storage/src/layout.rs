use crate::error::{StorageError, StorageResult};
use mediaharbor_core::{Config, MediaDirConfig, MediaType};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// On-disk layout of the upload root
///
/// ```text
/// <root>/<image subdir>/<file>
/// <root>/<audio subdir>/<correlation id>/<correlation id>.mp3
/// <root>/<video subdir>/<correlation id>/index.m3u8 + segment%03d.ts
/// <root>/<staging>/<images|audios|videos>/<staged upload>
/// ```
#[derive(Clone, Debug)]
pub struct MediaLayout {
    root: PathBuf,
    staging: PathBuf,
    image: MediaDirConfig,
    audio: MediaDirConfig,
    video: MediaDirConfig,
}

impl MediaLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        staging_dir: &str,
        image: MediaDirConfig,
        audio: MediaDirConfig,
        video: MediaDirConfig,
    ) -> Self {
        let root = root.into();
        let staging = root.join(staging_dir);
        Self {
            root,
            staging,
            image,
            audio,
            video,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.upload_root(),
            config.staging_dir(),
            config.media_dir(MediaType::Image).clone(),
            config.media_dir(MediaType::Audio).clone(),
            config.media_dir(MediaType::Video).clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn dir(&self, media_type: MediaType) -> &MediaDirConfig {
        match media_type {
            MediaType::Image => &self.image,
            MediaType::Audio => &self.audio,
            MediaType::Video => &self.video,
        }
    }

    /// Public URL prefix of one category, without slashes.
    pub fn alias(&self, media_type: MediaType) -> &str {
        &self.dir(media_type).alias
    }

    /// Directory holding the delivered assets of one category.
    pub fn media_root(&self, media_type: MediaType) -> PathBuf {
        self.root.join(&self.dir(media_type).subdir)
    }

    /// Directory receiving raw uploads of one category before routing.
    pub fn staging_root(&self, media_type: MediaType) -> PathBuf {
        self.staging.join(media_type.staging_dir_name())
    }

    /// Per-upload output directory for transcoded audio and video.
    pub fn output_dir(&self, media_type: MediaType, correlation_id: Uuid) -> PathBuf {
        self.media_root(media_type).join(correlation_id.to_string())
    }

    /// Every directory that must exist before uploads are accepted.
    pub fn required_dirs(&self) -> Vec<PathBuf> {
        MediaType::ALL
            .iter()
            .flat_map(|t| [self.media_root(*t), self.staging_root(*t)])
            .collect()
    }

    /// Public URL path for a file relative to a category's media root.
    pub fn public_path(&self, media_type: MediaType, relative: &str) -> String {
        format!(
            "/{}/{}",
            self.dir(media_type).alias,
            relative.trim_start_matches('/')
        )
    }

    /// Map a record's public path back to a file under the upload root.
    ///
    /// The longest matching alias wins, so `uploads/videos` takes precedence over
    /// `uploads`. Paths that would escape the category directory are rejected.
    pub fn resolve_public_path(&self, public_path: &str) -> StorageResult<PathBuf> {
        let trimmed = public_path.trim_start_matches('/');

        let mut candidates: Vec<MediaType> = MediaType::ALL.to_vec();
        candidates.sort_by_key(|t| std::cmp::Reverse(self.dir(*t).alias.len()));

        for media_type in candidates {
            let alias = &self.dir(media_type).alias;
            if let Some(rest) = trimmed.strip_prefix(alias.as_str()) {
                if let Some(relative) = rest.strip_prefix('/') {
                    return self.resolve_media_file(media_type, relative);
                }
            }
        }

        Err(StorageError::InvalidPath(public_path.to_string()))
    }

    /// Resolve `relative` inside the media root of `media_type`.
    pub fn resolve_media_file(&self, media_type: MediaType, relative: &str) -> StorageResult<PathBuf> {
        validate_relative(relative)?;

        let base = self.media_root(media_type);
        let path = base.join(relative);

        // Symlinks inside the tree must not lead outside of it
        if let (Ok(canonical), Ok(base_canonical)) = (path.canonicalize(), base.canonicalize()) {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidPath(relative.to_string()));
            }
        }

        Ok(path)
    }
}

fn validate_relative(relative: &str) -> StorageResult<()> {
    let invalid = relative.is_empty()
        || relative.starts_with('/')
        || relative.contains('\\')
        || relative.contains('\0')
        || relative
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(StorageError::InvalidPath(relative.to_string()));
    }
    Ok(())
}
