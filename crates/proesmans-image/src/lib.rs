#![deny(missing_docs)]
//! Scalar grids and three channel pictures for dense optical flow

/// scalar field representation for image processing purposes.
pub mod grid;

/// three channel picture built from host samples.
pub mod picture;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::grid::{Grid, ImageSize};
pub use crate::picture::{Picture, INTENSITY_SCALE};
