pub mod media;

pub use media::{MediaRecord, MediaType, NewMediaRecord, Pagination};
