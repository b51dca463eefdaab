#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// graphics-context collaborator contract.
pub mod context;

/// distort render pass module.
pub mod distort;

/// error types for the crate.
pub mod error;

/// output framebuffer sizing module.
pub mod geometry;

/// CPU reference backend.
pub mod software;

/// undistort render pass module.
pub mod undistort;

pub use crate::context::{RemapKernel, RenderContext, ViewCamera};
pub use crate::distort::DistortPass;
pub use crate::error::RenderError;
pub use crate::geometry::OutputGeometry;
pub use crate::software::{Frame, SoftwareContext};
pub use crate::undistort::UndistortPass;
