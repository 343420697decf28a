use proesmans_image::{ImageError, ImageSize};

use crate::parallel::ParallelError;

/// An error type for the flow module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FlowError {
    /// Error coming from the image module.
    #[error(transparent)]
    ImageError(#[from] ImageError),

    /// Error when a flow does not have the extents of its counterpart.
    #[error("Flow size mismatch: expected {expected}, got {actual}")]
    FlowSizeMismatch {
        /// The extents required by the operation.
        expected: ImageSize,
        /// The extents that were supplied.
        actual: ImageSize,
    },

    /// Error when a raw flow array does not hold two components per pixel.
    #[error("Flow data length ({0}) does not match the flow size ({1})")]
    InvalidFlowShape(usize, usize),

    /// Error when the smoothing parameter is not a finite positive number.
    #[error("lambda must be finite and > 0, got {0}")]
    InvalidLambda(f32),

    /// Error when the pyramid would shrink the input below the 3x3 stencil.
    #[error("{levels} pyramid levels are too many for an image of size {size}")]
    TooManyLevels {
        /// The number of requested levels.
        levels: usize,
        /// The size of the full resolution input.
        size: ImageSize,
    },

    /// Error when the picture is too small for the 3x3 stencils.
    #[error("Image of size {0} is too small, at least 3x3 pixels are required")]
    ImageTooSmall(ImageSize),

    /// Error when a flow value cannot be cast between the host type and `f32`.
    #[error("Failed to cast flow value to {0}")]
    CastError(String),

    /// Error coming from the parallel execution utilities.
    #[error(transparent)]
    ParallelError(#[from] ParallelError),
}
