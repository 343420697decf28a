#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// border replication for flows and gradient grids.
pub mod border;

/// forward/reverse flow agreement scoring.
pub mod consistency;

/// Error types for the flow module.
pub mod error;

/// conversion between host flow arrays and flow fields.
pub mod external;

/// flow field types.
pub mod flow;

/// spatial and temporal image gradients.
pub mod gradient;

/// bilinear sampling of grids.
pub mod interpolation;

/// least squares initial flow estimate.
pub mod lucas_kanade;

/// module containing parallelization utilities.
pub mod parallel;

/// engine configuration.
pub mod params;

/// coarse to fine driver of the flow estimation.
pub mod proesmans;

/// pyramid resampling of pictures and flows.
pub mod pyramid;

/// consistency weighted relaxation step.
pub mod relaxation;

pub use crate::error::FlowError;
pub use crate::flow::{Flow, TwinFlow};
pub use crate::params::ProesmansParams;
pub use crate::proesmans::{compute_flow, ProesmansResult};
