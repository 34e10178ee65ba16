//! Application state shared by every handler

use mediaharbor_core::Config;
use mediaharbor_db::MediaRecordStore;
use mediaharbor_processing::{MediaRouter, Transcoder};
use mediaharbor_storage::MediaLayout;
use std::sync::Arc;

/// Upload intake policy
#[derive(Clone, Debug)]
pub struct IntakeConfig {
    pub allowed_content_types: Vec<String>,
    pub max_upload_size_bytes: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MediaRecordStore>,
    pub media_router: MediaRouter,
    pub layout: MediaLayout,
    pub intake: IntakeConfig,
}

impl AppState {
    pub fn new(
        config: &Config,
        store: Arc<dyn MediaRecordStore>,
        transcoder: Arc<dyn Transcoder>,
    ) -> Self {
        let layout = MediaLayout::from_config(config);
        Self {
            store,
            media_router: MediaRouter::new(layout.clone(), transcoder),
            layout,
            intake: IntakeConfig {
                allowed_content_types: config.allowed_content_types().to_vec(),
                max_upload_size_bytes: config.max_upload_size_bytes(),
            },
        }
    }
}
