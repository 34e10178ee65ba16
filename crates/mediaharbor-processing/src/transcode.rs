//! FFmpeg invocation for audio and video transcoding

use async_trait::async_trait;
use mediaharbor_core::constants::{HLS_PLAYLIST_NAME, HLS_SEGMENT_PATTERN};
use mediaharbor_core::{AppError, Config};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

impl From<TranscodeError> for AppError {
    fn from(err: TranscodeError) -> Self {
        AppError::Transcode(err.to_string())
    }
}

/// A fully formed external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for TranscodeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external commands to completion.
pub struct CommandInvoker;

impl CommandInvoker {
    /// Run `command` once and wait for it to exit.
    ///
    /// Resolves with standard output on exit code 0. Any other exit status, or a
    /// failure to spawn, yields the process's standard error text.
    pub async fn invoke(command: &TranscodeCommand) -> Result<String, TranscodeError> {
        let started = std::time::Instant::now();

        let output = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TranscodeError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                command = %command,
                status = %output.status,
                stderr = %stderr,
                "External command failed"
            );
            return Err(TranscodeError::Failed {
                program: command.program.clone(),
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(
            program = %command.program,
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "External command finished"
        );

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// FFmpeg binary and preset parameters.
#[derive(Debug, Clone)]
pub struct FfmpegSettings {
    pub ffmpeg_path: String,
    pub hls_segment_duration: u64,
    pub audio_bitrate: String,
}

impl FfmpegSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path().to_string(),
            hls_segment_duration: config.hls_segment_duration(),
            audio_bitrate: config.audio_bitrate().to_string(),
        }
    }
}

impl Default for FfmpegSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            hls_segment_duration: 10,
            audio_bitrate: "192k".to_string(),
        }
    }
}

/// One transcode to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeJob {
    /// H.264/AAC HLS playlist `index.m3u8` plus `segment%03d.ts` files in `output_dir`
    VideoHls { input: PathBuf, output_dir: PathBuf },
    /// Single constant-bitrate MP3 at `output`
    AudioMp3 { input: PathBuf, output: PathBuf },
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

impl TranscodeJob {
    /// File the job produces on success.
    pub fn output_path(&self) -> PathBuf {
        match self {
            TranscodeJob::VideoHls { output_dir, .. } => output_dir.join(HLS_PLAYLIST_NAME),
            TranscodeJob::AudioMp3 { output, .. } => output.clone(),
        }
    }

    pub fn command(&self, settings: &FfmpegSettings) -> TranscodeCommand {
        let args = match self {
            TranscodeJob::VideoHls { input, output_dir } => vec![
                "-i".to_string(),
                lossy(input),
                "-codec:v".to_string(),
                "libx264".to_string(),
                "-codec:a".to_string(),
                "aac".to_string(),
                "-f".to_string(),
                "hls".to_string(),
                "-hls_time".to_string(),
                settings.hls_segment_duration.to_string(),
                "-hls_playlist_type".to_string(),
                "vod".to_string(),
                "-hls_segment_filename".to_string(),
                lossy(&output_dir.join(HLS_SEGMENT_PATTERN)),
                "-start_number".to_string(),
                "0".to_string(),
                lossy(&output_dir.join(HLS_PLAYLIST_NAME)),
            ],
            TranscodeJob::AudioMp3 { input, output } => vec![
                "-i".to_string(),
                lossy(input),
                "-codec:a".to_string(),
                "libmp3lame".to_string(),
                "-b:a".to_string(),
                settings.audio_bitrate.clone(),
                lossy(output),
            ],
        };

        TranscodeCommand {
            program: settings.ffmpeg_path.clone(),
            args,
        }
    }
}

/// Performs transcode jobs; the seam between the media router and the external tool.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run `job` to completion, returning the tool's standard output.
    async fn transcode(&self, job: &TranscodeJob) -> Result<String, TranscodeError>;
}

/// [`Transcoder`] backed by the ffmpeg command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    settings: FfmpegSettings,
}

impl FfmpegTranscoder {
    pub fn new(settings: FfmpegSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &FfmpegSettings {
        &self.settings
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self), fields(output = %job.output_path().display()))]
    async fn transcode(&self, job: &TranscodeJob) -> Result<String, TranscodeError> {
        let command = job.command(&self.settings);
        tracing::info!(command = %command, "Starting transcode");
        let stdout = CommandInvoker::invoke(&command).await?;
        tracing::info!("Transcode completed");
        Ok(stdout)
    }
}
