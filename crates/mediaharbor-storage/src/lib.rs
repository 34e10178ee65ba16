//! mediaharbor filesystem storage
//!
//! The upload root is the only shared mutable resource of the server. This crate
//! owns its layout: where each media category lives, how public record paths
//! map back onto disk and how staged output reaches its public location.

pub mod error;
pub mod layout;
pub mod provision;
pub mod staging;

pub use error::{StorageError, StorageResult};
pub use layout::MediaLayout;
pub use provision::{create_output_dir, ensure_dirs};
pub use staging::{discard_dir, publish_dir, scratch_dir, StagedUpload};
