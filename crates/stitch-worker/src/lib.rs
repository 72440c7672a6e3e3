//! Background stitching task and its message protocol.
//!
//! A caller sends one `find_matches` request carrying every image by value,
//! then receives zero or more `progress` events followed by exactly one
//! `result` or `error` event, after which the channel closes.

pub mod config;
pub mod messages;
pub mod worker;

// Re-exports for convenience
pub use config::WorkerConfig;
pub use messages::{BoundsPayload, ImagePayload, PositionPayload, WorkerEvent, WorkerRequest};
pub use worker::{StitchJob, start};

use stitch_core::StitchError;

/// Errors that end a worker run with an `error` event.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Image {index} pixels are not valid base64: {source}")]
    Decode {
        index: usize,
        source: base64::DecodeError,
    },

    #[error(transparent)]
    Core(#[from] StitchError),

    #[error("Stitching task failed: {0}")]
    Panicked(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, WorkerError>;
