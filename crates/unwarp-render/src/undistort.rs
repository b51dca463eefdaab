use glam::DVec2;

use unwarp_camera::LensProfile;

use crate::context::{RemapKernel, RenderContext};
use crate::error::RenderError;

const UNDISTORT_FRAGMENT: &str = include_str!("shaders/undistort.wgsl");

/// Remap kernel of the undistort pass: each output pixel is pulled from the
/// distorted source location the forward model projects it to.
pub struct UndistortKernel {
    profile: LensProfile,
    in_size: DVec2,
}

impl UndistortKernel {
    /// Create the kernel for a profile.
    pub fn new(profile: LensProfile) -> Self {
        Self {
            in_size: DVec2::new(profile.width as f64, profile.height as f64),
            profile,
        }
    }
}

impl RemapKernel for UndistortKernel {
    fn fragment_source(&self) -> String {
        UNDISTORT_FRAGMENT.to_string()
    }

    fn uniform_data(&self) -> Vec<f32> {
        let c = &self.profile.camera_matrix;
        let k = self.profile.distortion.as_array().map(|v| v as f32);
        vec![
            c.fx as f32,
            c.fy as f32,
            c.cx as f32,
            c.cy as f32,
            k[0],
            k[1],
            k[2],
            k[3],
            k[4],
            k[5],
            k[6],
            k[7],
            self.in_size.x as f32,
            self.in_size.y as f32,
            0.0,
            0.0,
        ]
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let (u, v) = self.profile.distort_point(x as f64, y as f64);
        (u as f32, v as f32)
    }
}

/// Render pass that produces a rectified view of a distorted source
///
/// Unlike [`crate::distort::DistortPass`] there is no offscreen target and
/// no output resizing: the pass binds its remap program around the caller's
/// own draws, and output dimensions equal input dimensions. Magnification
/// introduced by the correction is not compensated; callers needing the full
/// corrected field of view must pre-size their source accordingly.
pub struct UndistortPass<C: RenderContext> {
    profile: LensProfile,
    program: C::Program,
    active: bool,
}

impl<C: RenderContext> UndistortPass<C> {
    /// Create an undistort pass for a lens profile, compiling its remap
    /// program. The profile is copied.
    ///
    /// # Errors
    ///
    /// * The remap program fails to compile.
    pub fn new(ctx: &mut C, profile: &LensProfile) -> Result<Self, RenderError> {
        let program = ctx.compile_program(Box::new(UndistortKernel::new(profile.clone())))?;

        Ok(Self {
            profile: profile.clone(),
            program,
            active: false,
        })
    }

    /// The lens profile the pass was built from.
    pub fn profile(&self) -> &LensProfile {
        &self.profile
    }

    /// Bind the remap program; subsequent draws are rectified.
    ///
    /// # Panics
    ///
    /// Panics if the pass is already active.
    pub fn begin(&mut self, ctx: &mut C) {
        assert!(!self.active, "begin called while already active");
        self.active = true;
        ctx.bind_program(self.program);
    }

    /// Unbind the remap program.
    ///
    /// # Panics
    ///
    /// Panics if the pass is not active.
    pub fn end(&mut self, ctx: &mut C) {
        assert!(self.active, "end called without a matching begin");
        ctx.unbind_program();
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unwarp_camera::{CameraMatrix, DistortionCoefficients};

    #[test]
    fn kernel_map_is_the_forward_model() {
        let profile = LensProfile::new(
            640,
            480,
            CameraMatrix::new(640.0, 480.0, 320.0, 240.0),
            DistortionCoefficients::from_slice(&[-0.2, 0.05]),
        );
        let kernel = UndistortKernel::new(profile.clone());

        let (u, v) = profile.distort_point(100.0, 200.0);
        assert_eq!(kernel.map(100.0, 200.0), (u as f32, v as f32));
    }

    #[test]
    fn kernel_uniforms_layout() {
        let profile = LensProfile::new(
            640,
            480,
            CameraMatrix::new(640.0, 480.0, 320.0, 240.0),
            DistortionCoefficients::from_slice(&[-0.2, 0.05]),
        );
        let kernel = UndistortKernel::new(profile);

        let uniforms = kernel.uniform_data();
        assert_eq!(uniforms.len(), 16);
        assert_eq!(&uniforms[12..14], &[640.0, 480.0]);
    }
}
