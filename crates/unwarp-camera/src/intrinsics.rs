use serde::{Deserialize, Serialize};

/// Represents the intrinsic parameters of a pinhole camera
///
/// # Fields
///
/// * `fx` - The focal length in the x direction
/// * `fy` - The focal length in the y direction
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
/// * `skew` - The axis skew between the sensor axes
///
/// `fx` and `fy` are used as divisors by the distortion model and must be
/// non-zero; this is a precondition, not a runtime check. Degenerate focal
/// lengths propagate as non-finite values through the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraMatrix {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
    /// The axis skew between the sensor axes
    #[serde(default)]
    pub skew: f64,
}

impl CameraMatrix {
    /// Create a camera matrix from the focal lengths and principal point,
    /// with zero skew.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self {
            fx,
            fy,
            cx,
            cy,
            skew: 0.0,
        }
    }

    /// Create a camera matrix from a row-major 3x3 array
    /// `{fx, skew, cx, 0, fy, cy, 0, 0, 1}`.
    ///
    /// The fixed entries of the last row and first column are ignored.
    pub fn from_row_major(m: [f64; 9]) -> Self {
        Self {
            fx: m[0],
            fy: m[4],
            cx: m[2],
            cy: m[5],
            skew: m[1],
        }
    }

    /// Return the row-major 3x3 array form of the matrix.
    pub fn to_row_major(&self) -> [f64; 9] {
        [
            self.fx, self.skew, self.cx, 0.0, self.fy, self.cy, 0.0, 0.0, 1.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_roundtrip() {
        let m = CameraMatrix {
            fx: 640.0,
            fy: 480.0,
            cx: 320.0,
            cy: 240.0,
            skew: 0.5,
        };
        assert_eq!(CameraMatrix::from_row_major(m.to_row_major()), m);
    }

    #[test]
    fn row_major_layout() {
        let m = CameraMatrix::from_row_major([640.0, 0.5, 320.0, 0.0, 480.0, 240.0, 0.0, 0.0, 1.0]);
        assert_eq!(m.fx, 640.0);
        assert_eq!(m.fy, 480.0);
        assert_eq!(m.cx, 320.0);
        assert_eq!(m.cy, 240.0);
        assert_eq!(m.skew, 0.5);
    }
}
