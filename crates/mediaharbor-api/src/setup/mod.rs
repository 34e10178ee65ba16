//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use mediaharbor_core::Config;
use mediaharbor_db::MediaRepository;
use mediaharbor_processing::{FfmpegSettings, FfmpegTranscoder};
use mediaharbor_storage::{ensure_dirs, MediaLayout};
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.log_format())
        .context("Failed to initialize telemetry")?;

    config.validate().context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment(),
        upload_root = %config.upload_root().display(),
        "Configuration loaded and validated successfully"
    );

    let layout = MediaLayout::from_config(&config);
    ensure_dirs(layout.required_dirs())
        .await
        .context("Failed to create media directories")?;

    let pool = database::setup_database(&config).await?;

    let transcoder = Arc::new(FfmpegTranscoder::new(FfmpegSettings::from_config(&config)));
    let state = Arc::new(AppState::new(
        &config,
        Arc::new(MediaRepository::new(pool)),
        transcoder,
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
