pub mod health;
pub mod media_get;
pub mod media_stream;
pub mod media_upload;
