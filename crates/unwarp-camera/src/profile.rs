use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::distortion::{self, DistortionCoefficients};
use crate::error::CameraError;
use crate::intrinsics::CameraMatrix;

/// A validated set of lens calibration parameters
///
/// Bundles the nominal frame size with the camera intrinsics and the
/// distortion coefficients. The profile is an immutable value type and owns
/// no rendering resources; render passes copy it at construction, so profile
/// and pass lifetimes are independent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProfileFile", into = "ProfileFile")]
pub struct LensProfile {
    /// The nominal frame width in pixels
    pub width: usize,
    /// The nominal frame height in pixels
    pub height: usize,
    /// The intrinsic parameters of the camera
    pub camera_matrix: CameraMatrix,
    /// The distortion coefficients of the lens
    pub distortion: DistortionCoefficients,
}

/// On-disk form of a lens profile: a flat object of numeric fields, missing
/// fields defaulting to zero.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    width: usize,
    #[serde(default)]
    height: usize,
    #[serde(default)]
    fx: f64,
    #[serde(default)]
    fy: f64,
    #[serde(default)]
    cx: f64,
    #[serde(default)]
    cy: f64,
    #[serde(default)]
    skew: f64,
    #[serde(default)]
    k1: f64,
    #[serde(default)]
    k2: f64,
    #[serde(default)]
    k3: f64,
    #[serde(default)]
    k4: f64,
    #[serde(default)]
    k5: f64,
    #[serde(default)]
    k6: f64,
    #[serde(default)]
    p1: f64,
    #[serde(default)]
    p2: f64,
}

impl From<ProfileFile> for LensProfile {
    fn from(f: ProfileFile) -> Self {
        Self {
            width: f.width,
            height: f.height,
            camera_matrix: CameraMatrix {
                fx: f.fx,
                fy: f.fy,
                cx: f.cx,
                cy: f.cy,
                skew: f.skew,
            },
            distortion: DistortionCoefficients {
                k1: f.k1,
                k2: f.k2,
                p1: f.p1,
                p2: f.p2,
                k3: f.k3,
                k4: f.k4,
                k5: f.k5,
                k6: f.k6,
            },
        }
    }
}

impl From<LensProfile> for ProfileFile {
    fn from(p: LensProfile) -> Self {
        Self {
            width: p.width,
            height: p.height,
            fx: p.camera_matrix.fx,
            fy: p.camera_matrix.fy,
            cx: p.camera_matrix.cx,
            cy: p.camera_matrix.cy,
            skew: p.camera_matrix.skew,
            k1: p.distortion.k1,
            k2: p.distortion.k2,
            k3: p.distortion.k3,
            k4: p.distortion.k4,
            k5: p.distortion.k5,
            k6: p.distortion.k6,
            p1: p.distortion.p1,
            p2: p.distortion.p2,
        }
    }
}

impl LensProfile {
    /// Create a lens profile from explicit parameters.
    pub fn new(
        width: usize,
        height: usize,
        camera_matrix: CameraMatrix,
        distortion: DistortionCoefficients,
    ) -> Self {
        Self {
            width,
            height,
            camera_matrix,
            distortion,
        }
    }

    /// Load a lens profile from a JSON parameter file.
    ///
    /// The file is a flat object of the numeric fields `width`, `height`,
    /// `fx`, `fy`, `cx`, `cy`, `skew`, `k1`-`k6`, `p1`, `p2`; missing fields
    /// default to zero. On failure no profile is constructed.
    ///
    /// # Errors
    ///
    /// * The file cannot be read.
    /// * The file is not a valid JSON object of numeric fields.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CameraError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Map a pixel in the undistorted image to its location in the distorted
    /// source image. See [`distortion::distort_point`].
    pub fn distort_point(&self, x: f64, y: f64) -> (f64, f64) {
        distortion::distort_point(x, y, &self.camera_matrix, &self.distortion)
    }

    /// Approximate inverse of [`LensProfile::distort_point`]. See
    /// [`distortion::undistort_point_approx`].
    pub fn undistort_point_approx(&self, x: f64, y: f64) -> (f64, f64) {
        distortion::undistort_point_approx(x, y, &self.camera_matrix, &self.distortion)
    }
}
