use serde::{Deserialize, Serialize};

use crate::intrinsics::CameraMatrix;

/// Represents the distortion coefficients of a calibrated lens
///
/// The wire order of the coefficients is fixed as
/// `{k1, k2, p1, p2, k3, k4, k5, k6}`: `k1`-`k3` are the canonical radial
/// terms, `k4`-`k6` the rational-model denominator terms and `p1`, `p2` the
/// tangential terms. Calibration tools commonly emit only a prefix of this
/// sequence; the remaining coefficients are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistortionCoefficients {
    /// The first radial distortion coefficient
    #[serde(default)]
    pub k1: f64,
    /// The second radial distortion coefficient
    #[serde(default)]
    pub k2: f64,
    /// The first tangential distortion coefficient
    #[serde(default)]
    pub p1: f64,
    /// The second tangential distortion coefficient
    #[serde(default)]
    pub p2: f64,
    /// The third radial distortion coefficient
    #[serde(default)]
    pub k3: f64,
    /// The fourth radial distortion coefficient
    #[serde(default)]
    pub k4: f64,
    /// The fifth radial distortion coefficient
    #[serde(default)]
    pub k5: f64,
    /// The sixth radial distortion coefficient
    #[serde(default)]
    pub k6: f64,
}

impl DistortionCoefficients {
    /// Build the coefficients from a prefix of the wire order
    /// `{k1, k2, p1, p2, k3, k4, k5, k6}`.
    ///
    /// Shorter slices are zero-padded; entries past the eighth are ignored.
    pub fn from_slice(coeffs: &[f64]) -> Self {
        Self {
            k1: coeffs.first().copied().unwrap_or(0.0),
            k2: coeffs.get(1).copied().unwrap_or(0.0),
            p1: coeffs.get(2).copied().unwrap_or(0.0),
            p2: coeffs.get(3).copied().unwrap_or(0.0),
            k3: coeffs.get(4).copied().unwrap_or(0.0),
            k4: coeffs.get(5).copied().unwrap_or(0.0),
            k5: coeffs.get(6).copied().unwrap_or(0.0),
            k6: coeffs.get(7).copied().unwrap_or(0.0),
        }
    }

    /// Return the coefficients as an array in wire order.
    pub fn as_array(&self) -> [f64; 8] {
        [
            self.k1, self.k2, self.p1, self.p2, self.k3, self.k4, self.k5, self.k6,
        ]
    }

    /// Whether every coefficient is zero, in which case the model is the
    /// identity mapping.
    pub fn is_zero(&self) -> bool {
        self.as_array().iter().all(|c| *c == 0.0)
    }
}

/// Distort a pixel coordinate using the rational polynomial model
///
/// Maps a pixel location in the undistorted (rectilinear) image to the pixel
/// location in the distorted source image that a lens with the given
/// parameters projects it to.
///
/// # Arguments
///
/// * `x` - The x coordinate of the point in pixels
/// * `y` - The y coordinate of the point in pixels
/// * `camera` - The intrinsic parameters of the camera
/// * `distortion` - The distortion coefficients of the lens
///
/// # Returns
///
/// * `x` - The x coordinate of the distorted point in pixels
/// * `y` - The y coordinate of the distorted point in pixels
pub fn distort_point(
    x: f64,
    y: f64,
    camera: &CameraMatrix,
    distortion: &DistortionCoefficients,
) -> (f64, f64) {
    let (fx, fy, cx, cy) = (camera.fx, camera.fy, camera.cx, camera.cy);
    let (k1, k2, k3, k4, k5, k6, p1, p2) = (
        distortion.k1,
        distortion.k2,
        distortion.k3,
        distortion.k4,
        distortion.k5,
        distortion.k6,
        distortion.p1,
        distortion.p2,
    );

    // normalize the coordinates
    let x = (x - cx) / fx;
    let y = (y - cy) / fy;

    // calculate the radial distance
    let r2 = x * x + y * y;

    // radial distortion
    let kr = (1.0 + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2)
        / (1.0 + k4 * r2 + k5 * r2 * r2 + k6 * r2 * r2 * r2);

    // tangential distortion
    let xd = x * kr + 2.0 * p1 * x * y + p2 * (r2 + 2.0 * x * x);
    let yd = y * kr + p1 * (r2 + 2.0 * y * y) + 2.0 * p2 * x * y;

    // denormalize the coordinates
    let xdst = fx * xd + cx;
    let ydst = fy * yd + cy;

    (xdst, ydst)
}

/// Approximate the inverse of [`distort_point`]
///
/// The rational model has no closed-form inverse. This negates the forward
/// displacement at the input point, which is exact only for small distortion
/// and is intended for field-of-view bounding, not per-pixel resampling.
///
/// # Arguments
///
/// * `x` - The x coordinate of the point in pixels
/// * `y` - The y coordinate of the point in pixels
/// * `camera` - The intrinsic parameters of the camera
/// * `distortion` - The distortion coefficients of the lens
///
/// # Returns
///
/// * `x` - The x coordinate of the undistorted point in pixels
/// * `y` - The y coordinate of the undistorted point in pixels
pub fn undistort_point_approx(
    x: f64,
    y: f64,
    camera: &CameraMatrix,
    distortion: &DistortionCoefficients,
) -> (f64, f64) {
    let xn = (x - camera.cx) / camera.fx;
    let yn = (y - camera.cy) / camera.fy;
    let r2 = xn * xn + yn * yn;
    let denom =
        1.0 + distortion.k4 * r2 + distortion.k5 * r2 * r2 + distortion.k6 * r2 * r2 * r2;
    if denom <= 0.0 {
        log::warn!("rational denominator {denom} is not positive at ({x}, {y})");
    }

    let (xd, yd) = distort_point(x, y, camera, distortion);

    (x - (xd - x), y - (yd - y))
}
