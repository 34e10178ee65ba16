//! mediaharbor HTTP API
//!
//! Upload intake, media listing and range-aware delivery over axum.

mod api_doc;
pub mod error;
mod handlers;
mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
