//! Image-mosaic stitching core.
//!
//! Scores pixel overlap between image pairs over a discrete set of
//! scale/direction/shift hypotheses, then greedily assembles every image
//! into one coordinate space anchored at the first image.

pub mod assemble;
pub mod bounds;
pub mod direction;
pub mod matcher;
pub mod metric;
pub mod options;
pub mod pipeline;
pub mod raster;
pub mod search;

// Re-exports for convenience
pub use assemble::{Assembly, Placement, Position, assemble};
pub use bounds::{CanvasBounds, CanvasSize, compute_bounds};
pub use direction::{Direction, OverlapWindow};
pub use matcher::{MatchResult, match_all};
pub use metric::overlap_error;
pub use options::StitchOptions;
pub use pipeline::{Progress, Stage, StitchOutcome, stitch, stitch_with_control};
pub use raster::Image;
pub use search::{Candidate, search_match, search_scaled};

/// Minimum number of images a stitching run accepts.
pub const MIN_IMAGES: usize = 2;

/// Errors that abort a stitching run.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    #[error("At least {min} images are required, got {0}", min = MIN_IMAGES)]
    TooFewImages(usize),

    #[error("Image {index} has zero width or height")]
    EmptyImage { index: usize },

    #[error("Image {index} pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Image at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Stitching was cancelled")]
    Cancelled,
}

/// Result type alias for stitching operations.
pub type Result<T> = std::result::Result<T, StitchError>;
