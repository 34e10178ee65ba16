//! mediaharbor media processing
//!
//! Turns staged uploads into deliverable assets: images are moved into place,
//! audio is transcoded to MP3 and video to an HLS playlist with segments.

pub mod router;
pub mod transcode;

pub use router::{MediaRouter, PublishedMedia, RoutedMedia};
pub use transcode::{
    CommandInvoker, FfmpegSettings, FfmpegTranscoder, TranscodeCommand, TranscodeError,
    TranscodeJob, Transcoder,
};
