//! Per-category dispatch of staged uploads

use crate::transcode::{TranscodeJob, Transcoder};
use mediaharbor_core::constants::HLS_PLAYLIST_NAME;
use mediaharbor_core::{AppError, MediaType};
use mediaharbor_storage::{discard_dir, ensure_dirs, publish_dir, scratch_dir, MediaLayout, StagedUpload};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::{TempDir, TempPath};
use uuid::Uuid;

/// Produced asset that is not public yet.
#[derive(Debug)]
enum PendingAsset {
    /// Image already moved into the image directory
    File(TempPath),
    /// Transcode output still inside the staging area
    Dir { scratch: TempDir, target: PathBuf },
}

/// Result of routing one upload.
///
/// The produced asset is removed when this value is dropped without
/// [`RoutedMedia::publish`].
#[derive(Debug)]
pub struct RoutedMedia {
    pub media_type: MediaType,
    /// Public URL path of the delivered asset
    pub path: String,
    pub correlation_id: Uuid,
    asset: PendingAsset,
}

impl RoutedMedia {
    /// Move the asset to its public location.
    pub async fn publish(self) -> Result<PublishedMedia, AppError> {
        let location = match self.asset {
            PendingAsset::File(file) => file.keep().map_err(|e| AppError::Io(e.error))?,
            PendingAsset::Dir { scratch, target } => publish_dir(scratch, &target).await?,
        };

        Ok(PublishedMedia {
            media_type: self.media_type,
            path: self.path,
            correlation_id: self.correlation_id,
            location,
        })
    }

    /// Remove the unpublished asset.
    pub async fn discard(self) {
        match self.asset {
            PendingAsset::File(file) => {
                if let Err(e) = file.close() {
                    tracing::warn!(error = %e, "Failed to remove placed image");
                }
            }
            PendingAsset::Dir { scratch, .. } => discard_dir(scratch).await,
        }
    }
}

/// An asset in its public location.
#[derive(Debug)]
pub struct PublishedMedia {
    pub media_type: MediaType,
    pub path: String,
    pub correlation_id: Uuid,
    /// Image file or per-upload output directory
    pub location: PathBuf,
}

impl PublishedMedia {
    /// Take the asset down again, e.g. when its record could not be saved.
    pub async fn unpublish(self) {
        let result = match self.media_type {
            MediaType::Image => tokio::fs::remove_file(&self.location).await,
            MediaType::Audio | MediaType::Video => tokio::fs::remove_dir_all(&self.location).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(path = %self.location.display(), "Removed published asset");
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.location.display(),
                    error = %e,
                    "Failed to remove published asset"
                );
            }
        }
    }
}

/// Routes staged uploads to image placement, audio transcode or video transcode.
#[derive(Clone)]
pub struct MediaRouter {
    layout: MediaLayout,
    transcoder: Arc<dyn Transcoder>,
}

impl MediaRouter {
    pub fn new(layout: MediaLayout, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { layout, transcoder }
    }

    pub fn layout(&self) -> &MediaLayout {
        &self.layout
    }

    #[tracing::instrument(
        skip(self, staged),
        fields(media_type = %staged.media_type, filename = %staged.filename, correlation_id)
    )]
    pub async fn route(&self, staged: StagedUpload) -> Result<RoutedMedia, AppError> {
        let correlation_id = Uuid::new_v4();
        tracing::Span::current().record("correlation_id", tracing::field::display(correlation_id));

        let routed = match staged.media_type {
            MediaType::Image => self.place_image(staged, correlation_id).await?,
            MediaType::Audio => {
                let file_name = format!("{}.mp3", correlation_id);
                let rel = format!("{}/{}", correlation_id, file_name);
                self.transcode(staged, correlation_id, &rel, |input, out| TranscodeJob::AudioMp3 {
                    input,
                    output: out.join(&file_name),
                })
                .await?
            }
            MediaType::Video => {
                let rel = format!("{}/{}", correlation_id, HLS_PLAYLIST_NAME);
                self.transcode(staged, correlation_id, &rel, |input, out| TranscodeJob::VideoHls {
                    input,
                    output_dir: out.to_path_buf(),
                })
                .await?
            }
        };

        tracing::info!(path = %routed.path, "Media routed");
        Ok(routed)
    }

    async fn place_image(
        &self,
        staged: StagedUpload,
        correlation_id: Uuid,
    ) -> Result<RoutedMedia, AppError> {
        let image_root = self.layout.media_root(MediaType::Image);
        ensure_dirs([&image_root]).await?;

        let target = image_root.join(&staged.filename);
        let asset = TempPath::from_path(&target);

        if let Err(e) = tokio::fs::rename(staged.path(), &target).await {
            // Staging on a different filesystem than the image directory
            tracing::debug!(error = %e, "Rename failed, copying staged image instead");
            tokio::fs::copy(staged.path(), &target).await?;
        }

        Ok(RoutedMedia {
            media_type: MediaType::Image,
            path: self.layout.public_path(MediaType::Image, &asset_name(&target)),
            correlation_id,
            asset: PendingAsset::File(asset),
        })
    }

    /// Run one transcode into a scratch directory in the staging area.
    async fn transcode<F>(
        &self,
        staged: StagedUpload,
        correlation_id: Uuid,
        public_rel: &str,
        job: F,
    ) -> Result<RoutedMedia, AppError>
    where
        F: FnOnce(PathBuf, &Path) -> TranscodeJob,
    {
        let media_type = staged.media_type;
        let scratch = scratch_dir(&self.layout.staging_root(media_type), correlation_id).await?;
        let job = job(staged.path().to_path_buf(), scratch.path());

        if let Err(e) = self.transcoder.transcode(&job).await {
            discard_dir(scratch).await;
            return Err(e.into());
        }

        Ok(RoutedMedia {
            media_type,
            path: self.layout.public_path(media_type, public_rel),
            correlation_id,
            asset: PendingAsset::Dir {
                scratch,
                target: self.layout.output_dir(media_type, correlation_id),
            },
        })
    }
}

fn asset_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcode::TranscodeError;
    use async_trait::async_trait;
    use mediaharbor_core::MediaDirConfig;
    use std::sync::Mutex;

    /// Writes plausible outputs instead of running ffmpeg.
    #[derive(Default)]
    struct FakeTranscoder {
        jobs: Mutex<Vec<TranscodeJob>>,
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn transcode(&self, job: &TranscodeJob) -> Result<String, TranscodeError> {
            self.jobs.lock().unwrap().push(job.clone());
            match job {
                TranscodeJob::VideoHls { output_dir, .. } => {
                    std::fs::write(output_dir.join("index.m3u8"), "#EXTM3U\n").unwrap();
                    std::fs::write(output_dir.join("segment000.ts"), [0x47u8; 188]).unwrap();
                }
                TranscodeJob::AudioMp3 { output, .. } => {
                    std::fs::write(output, b"ID3").unwrap();
                }
            }
            Ok(String::new())
        }
    }

    /// Leaves a partial segment behind and fails like a broken input would.
    struct FailingTranscoder;

    #[async_trait]
    impl Transcoder for FailingTranscoder {
        async fn transcode(&self, job: &TranscodeJob) -> Result<String, TranscodeError> {
            if let TranscodeJob::VideoHls { output_dir, .. } = job {
                std::fs::write(output_dir.join("segment000.ts"), b"partial").unwrap();
            }
            Err(TranscodeError::Failed {
                program: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            })
        }
    }

    fn layout(root: &Path) -> MediaLayout {
        let dir = |name: &str| MediaDirConfig {
            subdir: name.to_string(),
            alias: format!("uploads/{}", name),
        };
        MediaLayout::new(root, ".staging", dir("images"), dir("audios"), dir("videos"))
    }

    fn stage(layout: &MediaLayout, media_type: MediaType, filename: &str) -> StagedUpload {
        let dir = layout.staging_root(media_type);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(filename);
        std::fs::write(&path, b"raw upload").unwrap();
        StagedUpload::new(
            TempPath::from_path(&path),
            filename.to_string(),
            filename.to_string(),
            "application/octet-stream".to_string(),
            media_type,
            10,
        )
    }

    fn count_entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_image_is_moved_into_image_dir() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let staged = stage(&layout, MediaType::Image, "mediaFile-abc.png");
        let staged_path = staged.path().to_path_buf();
        let routed = router.route(staged).await.unwrap();

        assert_eq!(routed.path, "/uploads/images/mediaFile-abc.png");
        assert!(!staged_path.exists());
        let published = routed.publish().await.unwrap();
        assert_eq!(published.location, temp.path().join("images/mediaFile-abc.png"));
        assert_eq!(std::fs::read(&published.location).unwrap(), b"raw upload");
    }

    #[tokio::test]
    async fn test_audio_is_transcoded_in_staging_then_published() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let transcoder = Arc::new(FakeTranscoder::default());
        let router = MediaRouter::new(layout.clone(), transcoder.clone());

        let staged = stage(&layout, MediaType::Audio, "mediaFile-abc.wav");
        let staged_path = staged.path().to_path_buf();
        let routed = router.route(staged).await.unwrap();

        let cid = routed.correlation_id;
        assert_eq!(routed.path, format!("/uploads/audios/{cid}/{cid}.mp3"));
        assert!(!staged_path.exists(), "staged input should be consumed");
        assert!(!layout.output_dir(MediaType::Audio, cid).exists());

        let jobs = transcoder.jobs.lock().unwrap().clone();
        match jobs.as_slice() {
            [TranscodeJob::AudioMp3 { input, output }] => {
                assert_eq!(input, &staged_path);
                assert!(output.starts_with(layout.staging_root(MediaType::Audio)));
                assert!(output.ends_with(format!("{cid}.mp3")));
            }
            other => panic!("Unexpected jobs: {:?}", other),
        }

        let published = routed.publish().await.unwrap();
        assert_eq!(published.location, layout.output_dir(MediaType::Audio, cid));
        assert!(temp.path().join(format!("audios/{cid}/{cid}.mp3")).exists());
        assert_eq!(count_entries(&layout.staging_root(MediaType::Audio)), 0);
    }

    #[tokio::test]
    async fn test_video_produces_playlist_path() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let routed = router
            .route(stage(&layout, MediaType::Video, "mediaFile-abc.mp4"))
            .await
            .unwrap();

        let cid = routed.correlation_id;
        assert_eq!(routed.path, format!("/uploads/videos/{cid}/index.m3u8"));
        let published = routed.publish().await.unwrap();
        assert_eq!(
            layout.resolve_public_path(&published.path).unwrap(),
            published.location.join("index.m3u8")
        );
        assert!(temp.path().join(format!("videos/{cid}/segment000.ts")).exists());
    }

    #[tokio::test]
    async fn test_unpublished_output_is_removed_on_drop() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let routed = router
            .route(stage(&layout, MediaType::Video, "mediaFile-abc.mp4"))
            .await
            .unwrap();
        let staging = layout.staging_root(MediaType::Video);
        assert_eq!(count_entries(&staging), 1);

        drop(routed);
        assert_eq!(count_entries(&staging), 0);
        assert_eq!(count_entries(&layout.media_root(MediaType::Video)), 0);
    }

    #[tokio::test]
    async fn test_discard_removes_placed_image() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let routed = router
            .route(stage(&layout, MediaType::Image, "mediaFile-abc.png"))
            .await
            .unwrap();
        routed.discard().await;

        assert_eq!(count_entries(&layout.media_root(MediaType::Image)), 0);
        assert_eq!(count_entries(&layout.staging_root(MediaType::Image)), 0);
    }

    #[tokio::test]
    async fn test_publish_refuses_existing_output_dir() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let routed = router
            .route(stage(&layout, MediaType::Audio, "mediaFile-abc.wav"))
            .await
            .unwrap();
        let target = layout.output_dir(MediaType::Audio, routed.correlation_id);
        std::fs::create_dir_all(&target).unwrap();

        match routed.publish().await {
            Err(AppError::Internal(msg)) => assert!(msg.contains("already in use")),
            other => panic!("Expected Internal error, got {:?}", other),
        }
        assert_eq!(count_entries(&target), 0);
        assert_eq!(count_entries(&layout.staging_root(MediaType::Audio)), 0);
    }

    #[tokio::test]
    async fn test_unpublish_removes_output_dir() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FakeTranscoder::default()));

        let routed = router
            .route(stage(&layout, MediaType::Video, "mediaFile-abc.mp4"))
            .await
            .unwrap();
        let published = routed.publish().await.unwrap();
        assert!(published.location.exists());

        published.unpublish().await;
        assert_eq!(count_entries(&layout.media_root(MediaType::Video)), 0);
    }

    #[tokio::test]
    async fn test_failed_transcode_cleans_up() {
        let temp = tempfile::tempdir().unwrap();
        let layout = layout(temp.path());
        let router = MediaRouter::new(layout.clone(), Arc::new(FailingTranscoder));

        let staged = stage(&layout, MediaType::Video, "mediaFile-abc.mp4");
        let staged_path = staged.path().to_path_buf();

        match router.route(staged).await {
            Err(AppError::Transcode(msg)) => assert!(msg.contains("Invalid data")),
            other => panic!("Expected Transcode error, got {:?}", other),
        }

        assert!(!staged_path.exists());
        assert_eq!(count_entries(&layout.staging_root(MediaType::Video)), 0);
        assert_eq!(count_entries(&layout.media_root(MediaType::Video)), 0);
    }
}
