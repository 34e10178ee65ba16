//! mediaharbor core library
//!
//! Domain models, error types, configuration and naming helpers shared by
//! every mediaharbor crate.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod naming;

// Re-export commonly used types
pub use config::{Config, MediaDirConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{MediaRecord, MediaType, NewMediaRecord, Pagination};
pub use naming::clean_media_name;
