//! Configuration module
//!
//! Configuration is read once at startup from the process environment (plus an
//! optional `.env` file) and passed by reference to every component that needs it.

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_ALLOWED_CONTENT_TYPES, RESERVED_ROUTE_PREFIXES};
use crate::models::MediaType;

// Common constants
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_SIZE_MB: usize = 500;
const HLS_SEGMENT_DURATION: u64 = 10;
const AUDIO_BITRATE: &str = "192k";
const RATE_LIMIT_MAX: u32 = 100;
const RATE_LIMIT_WINDOW_SECS: u64 = 15 * 60;
const UPLOAD_ROOT: &str = "./uploads";
const STAGING_DIR: &str = ".staging";

/// Subdirectory on disk and public URL alias for one media category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaDirConfig {
    /// Directory name under the upload root (e.g. `videos`)
    pub subdir: String,
    /// Public URL prefix written into record paths (e.g. `uploads/videos`)
    pub alias: String,
}

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub rate_limit_max: u32,
    pub rate_limit_window_secs: u64,
    pub environment: String,
    pub log_format: String,
}

/// Media server configuration
#[derive(Clone, Debug)]
pub struct MediaServerConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Upload layout
    pub upload_root: PathBuf,
    pub staging_dir: String,
    pub image: MediaDirConfig,
    pub audio: MediaDirConfig,
    pub video: MediaDirConfig,
    // Intake
    pub allowed_content_types: Vec<String>,
    pub max_upload_size_bytes: usize,
    // Transcoding
    pub ffmpeg_path: String,
    pub hls_segment_duration: u64,
    pub audio_bitrate: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaServerConfig>);

impl Config {
    fn inner(&self) -> &MediaServerConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().base.environment)
    }

    /// Load configuration from the environment, reading `.env` first when present.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = MediaServerConfig::from_lookup(&lookup)?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn rate_limit_max(&self) -> u32 {
        self.inner().base.rate_limit_max
    }

    pub fn rate_limit_window_secs(&self) -> u64 {
        self.inner().base.rate_limit_window_secs
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.inner().base.log_format
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn upload_root(&self) -> &Path {
        &self.inner().upload_root
    }

    pub fn staging_dir(&self) -> &str {
        &self.inner().staging_dir
    }

    pub fn media_dir(&self, media_type: MediaType) -> &MediaDirConfig {
        match media_type {
            MediaType::Image => &self.inner().image,
            MediaType::Audio => &self.inner().audio,
            MediaType::Video => &self.inner().video,
        }
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.inner().ffmpeg_path
    }

    pub fn hls_segment_duration(&self) -> u64 {
        self.inner().hls_segment_duration
    }

    pub fn audio_bitrate(&self) -> &str {
        &self.inner().audio_bitrate
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

fn required<F>(lookup: &F, key: &str) -> Result<String, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} must be set", key))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl MediaServerConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins = split_list(&required(lookup, "CORS_ORIGIN")?);
        if is_production_name(&environment) && cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGIN cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let base = BaseConfig {
            server_port: required(lookup, "PORT")?
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            rate_limit_max: lookup("RATE_LIMIT_MAX")
                .and_then(|v| v.parse().ok())
                .unwrap_or(RATE_LIMIT_MAX),
            rate_limit_window_secs: lookup("RATE_LIMIT_WINDOW_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(RATE_LIMIT_WINDOW_SECS),
            environment,
            log_format: lookup("LOG_FORMAT").unwrap_or_else(|| "compact".to_string()),
        };

        let media_dir = |subdir_key: &str, alias_key: &str| -> Result<MediaDirConfig, anyhow::Error> {
            Ok(MediaDirConfig {
                subdir: required(lookup, subdir_key)?
                    .trim_matches('/')
                    .to_string(),
                alias: required(lookup, alias_key)?.trim_matches('/').to_string(),
            })
        };

        let allowed_content_types = lookup("ALLOWED_CONTENT_TYPES")
            .map(|v| {
                split_list(&v)
                    .into_iter()
                    .map(|s| s.to_lowercase())
                    .collect()
            })
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_CONTENT_TYPES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            });

        let max_upload_size_mb = lookup("MAX_UPLOAD_SIZE_MB")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        Ok(MediaServerConfig {
            base,
            database_url: required(lookup, "DATABASE_URL")?,
            upload_root: PathBuf::from(
                lookup("UPLOAD_ROOT").unwrap_or_else(|| UPLOAD_ROOT.to_string()),
            ),
            staging_dir: lookup("STAGING_DIR")
                .map(|v| v.trim_matches('/').to_string())
                .unwrap_or_else(|| STAGING_DIR.to_string()),
            image: media_dir("IMAGE", "IMAGE_DIR")?,
            audio: media_dir("AUDIO", "AUDIO_DIR")?,
            video: media_dir("VIDEO", "VIDEO_DIR")?,
            allowed_content_types,
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            ffmpeg_path: lookup("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            hls_segment_duration: lookup("HLS_SEGMENT_DURATION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(HLS_SEGMENT_DURATION),
            audio_bitrate: lookup("AUDIO_BITRATE").unwrap_or_else(|| AUDIO_BITRATE.to_string()),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        let dirs = [&self.image, &self.audio, &self.video];
        for dir in dirs {
            for value in [&dir.subdir, &dir.alias] {
                if value.split('/').any(|segment| segment == ".." || segment.is_empty()) {
                    return Err(anyhow::anyhow!(
                        "Media directory '{}' must be a non-empty relative path without '..'",
                        value
                    ));
                }
            }
        }

        if self.image.subdir == self.audio.subdir
            || self.image.subdir == self.video.subdir
            || self.audio.subdir == self.video.subdir
        {
            return Err(anyhow::anyhow!(
                "IMAGE, AUDIO and VIDEO must name distinct directories"
            ));
        }

        if self.image.alias == self.audio.alias
            || self.image.alias == self.video.alias
            || self.audio.alias == self.video.alias
        {
            return Err(anyhow::anyhow!(
                "IMAGE_DIR, AUDIO_DIR and VIDEO_DIR must be distinct URL aliases"
            ));
        }

        for dir in dirs {
            let first_segment = dir.alias.split('/').next().unwrap_or_default();
            if RESERVED_ROUTE_PREFIXES.contains(&first_segment) {
                return Err(anyhow::anyhow!(
                    "Media alias '{}' collides with the reserved '/{}' routes",
                    dir.alias,
                    first_segment
                ));
            }
        }

        if dirs.iter().any(|dir| dir.subdir == self.staging_dir) {
            return Err(anyhow::anyhow!(
                "STAGING_DIR must differ from the media directories"
            ));
        }

        if self.hls_segment_duration == 0 {
            return Err(anyhow::anyhow!("HLS_SEGMENT_DURATION must be at least 1"));
        }

        if self.base.rate_limit_max == 0 || self.base.rate_limit_window_secs == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_MAX and RATE_LIMIT_WINDOW_SECS must be positive"
            ));
        }

        Ok(())
    }
}
