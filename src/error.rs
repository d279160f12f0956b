//! Error types for the spatial-analysis engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while building engine state from an input raster.
///
/// The algorithms themselves are total: once segmentation or a grid build
/// has accepted an image, classification and pathfinding cannot fail — an
/// unreachable goal is an empty path, not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The input raster has no pixels. Segmentation and grid sizing both
    /// divide by the image dimensions, so zero-area input is rejected up
    /// front instead of propagating a division by zero.
    #[error("input image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The image is smaller than a single grid cell, so no walkability grid
    /// can be sampled from it.
    #[error("image ({width}x{height}) is smaller than one {node_size}px grid cell")]
    ImageSmallerThanCell {
        width: u32,
        height: u32,
        node_size: u32,
    },

    /// The analysis worker has shut down and can no longer accept requests.
    #[error("analysis worker is no longer running")]
    WorkerClosed,
}
