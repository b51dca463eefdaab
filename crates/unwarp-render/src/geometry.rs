use glam::DVec2;

use unwarp_camera::LensProfile;

/// Placement of the nominal frame inside the oversized offscreen buffer
///
/// Derived once per lens profile and consumed every frame by the distort
/// pass: `frame_buffer_size` is the offscreen target size,
/// `top_left` the buffer-space location of the nominal frame origin, and
/// `projection_scale` the factor applied to the projection matrix so the
/// full buffer extent renders the nominal field of view plus the periphery
/// the distortion can pull in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputGeometry {
    /// The offscreen buffer size in pixels
    pub frame_buffer_size: DVec2,
    /// The top-left corner of the bounding box in nominal pixel coordinates
    pub top_left: DVec2,
    /// The projection rescale factor `nominal / frame_buffer_size`
    pub projection_scale: DVec2,
}

impl OutputGeometry {
    /// Compute the output geometry for a lens profile.
    ///
    /// Samples the approximate inverse mapping at the four corners and four
    /// edge midpoints of the nominal frame and fits the axis-aligned
    /// bounding box of the samples. Boundary sampling assumes distortion is
    /// monotonic from center to edge; for pathological coefficient sets the
    /// box is not guaranteed to be tight.
    pub fn from_profile(profile: &LensProfile) -> Self {
        let w = profile.width as f64;
        let h = profile.height as f64;

        let boundary = [
            (0.0, 0.0),
            (w / 2.0, 0.0),
            (w, 0.0),
            (0.0, h / 2.0),
            (w, h / 2.0),
            (0.0, h),
            (w / 2.0, h),
            (w, h),
        ];

        let mut top_left = DVec2::INFINITY;
        let mut bottom_right = DVec2::NEG_INFINITY;
        for (x, y) in boundary {
            let uv = DVec2::from(profile.undistort_point_approx(x, y));
            top_left = top_left.min(uv);
            bottom_right = bottom_right.max(uv);
        }

        let frame_buffer_size = bottom_right - top_left;

        Self {
            frame_buffer_size,
            top_left,
            projection_scale: DVec2::new(w, h) / frame_buffer_size,
        }
    }

    /// The offscreen target allocation size, rounded up to whole pixels.
    pub fn target_size(&self) -> (u32, u32) {
        (
            self.frame_buffer_size.x.ceil() as u32,
            self.frame_buffer_size.y.ceil() as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unwarp_camera::{CameraMatrix, DistortionCoefficients};

    fn profile(coeffs: &[f64]) -> LensProfile {
        LensProfile::new(
            640,
            480,
            CameraMatrix::new(640.0, 480.0, 320.0, 240.0),
            DistortionCoefficients::from_slice(coeffs),
        )
    }

    #[test]
    fn zero_distortion_is_identity() {
        let geometry = OutputGeometry::from_profile(&profile(&[]));

        assert_eq!(geometry.frame_buffer_size, DVec2::new(640.0, 480.0));
        assert_eq!(geometry.top_left, DVec2::ZERO);
        assert_eq!(geometry.projection_scale, DVec2::ONE);
        assert_eq!(geometry.target_size(), (640, 480));
    }

    #[test]
    fn barrel_distortion_grows_the_buffer() {
        // hand-computed boundary samples for k1 = -0.3:
        //   (0, 0)    -> (-48, -36)
        //   (320, 0)  -> (320, -18)
        //   (0, 240)  -> (-24, 240)
        // and symmetric values at the remaining points
        let geometry = OutputGeometry::from_profile(&profile(&[-0.3]));

        approx::assert_relative_eq!(geometry.top_left.x, -48.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.top_left.y, -36.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.frame_buffer_size.x, 736.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.frame_buffer_size.y, 552.0, epsilon = 1e-4);
        approx::assert_relative_eq!(
            geometry.projection_scale.x,
            640.0 / 736.0,
            epsilon = 1e-6
        );
        approx::assert_relative_eq!(
            geometry.projection_scale.y,
            480.0 / 552.0,
            epsilon = 1e-6
        );

        assert!(geometry.frame_buffer_size.x >= 640.0);
        assert!(geometry.frame_buffer_size.y >= 480.0);
    }

    #[test]
    fn pincushion_distortion_shrinks_the_buffer() {
        let geometry = OutputGeometry::from_profile(&profile(&[0.1]));

        approx::assert_relative_eq!(geometry.top_left.x, 8.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.top_left.y, 6.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.frame_buffer_size.x, 624.0, epsilon = 1e-4);
        approx::assert_relative_eq!(geometry.frame_buffer_size.y, 468.0, epsilon = 1e-4);

        assert!(geometry.projection_scale.x > 1.0);
        assert!(geometry.projection_scale.y > 1.0);
    }

    #[test]
    fn boundary_samples_match_the_model() {
        let profile = profile(&[-0.3, 0.05, 0.001, -0.002]);
        let geometry = OutputGeometry::from_profile(&profile);

        // the box must contain every boundary sample
        let (w, h) = (640.0, 480.0);
        for (x, y) in [
            (0.0, 0.0),
            (w / 2.0, 0.0),
            (w, 0.0),
            (0.0, h / 2.0),
            (w, h / 2.0),
            (0.0, h),
            (w / 2.0, h),
            (w, h),
        ] {
            let uv = DVec2::from(profile.undistort_point_approx(x, y));
            let bottom_right = geometry.top_left + geometry.frame_buffer_size;
            assert!(uv.x >= geometry.top_left.x - 1e-9 && uv.x <= bottom_right.x + 1e-9);
            assert!(uv.y >= geometry.top_left.y - 1e-9 && uv.y <= bottom_right.y + 1e-9);
        }
    }
}
