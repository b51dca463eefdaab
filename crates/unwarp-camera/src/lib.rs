#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// lens distortion model module.
pub mod distortion;

/// error types for the crate.
pub mod error;

/// pinhole camera intrinsics module.
pub mod intrinsics;

/// lens profile module.
pub mod profile;

pub use crate::distortion::{distort_point, undistort_point_approx, DistortionCoefficients};
pub use crate::error::CameraError;
pub use crate::intrinsics::CameraMatrix;
pub use crate::profile::LensProfile;
