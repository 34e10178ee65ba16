//! mediaharbor persistence
//!
//! [`MediaRecordStore`] is the storage seam used by the HTTP layer. The
//! Postgres implementation lives in [`db`]; an in-process implementation is
//! available behind the `memory` feature.

pub mod db;
#[cfg(feature = "memory")]
pub mod memory;
pub mod store;

pub use db::{run_migrations, MediaRepository, MIGRATOR};
#[cfg(feature = "memory")]
pub use memory::InMemoryMediaStore;
pub use store::MediaRecordStore;
