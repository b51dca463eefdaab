use glam::{DVec2, Mat4, Vec3};

use unwarp_camera::LensProfile;

use crate::context::{RemapKernel, RenderContext, ViewCamera};
use crate::error::RenderError;
use crate::geometry::OutputGeometry;

const DISTORT_FRAGMENT: &str = include_str!("shaders/distort.wgsl");

/// Remap kernel of the distort pass
///
/// For each output pixel the kernel forward-distorts the output coordinate,
/// negates the displacement and offsets the result into offscreen-buffer
/// space, yielding the buffer location whose distorted position lands on the
/// output pixel.
pub struct DistortKernel {
    profile: LensProfile,
    frame_buffer_size: DVec2,
    offset: DVec2,
}

impl DistortKernel {
    /// Create the kernel for a profile and its output geometry.
    pub fn new(profile: LensProfile, geometry: &OutputGeometry) -> Self {
        Self {
            frame_buffer_size: geometry.frame_buffer_size,
            offset: -geometry.top_left,
            profile,
        }
    }
}

impl RemapKernel for DistortKernel {
    fn fragment_source(&self) -> String {
        DISTORT_FRAGMENT.to_string()
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
            self.frame_buffer_size.x as f32,
            self.frame_buffer_size.y as f32,
            self.offset.x as f32,
            self.offset.y as f32,
        ]
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let (u, v) = self.profile.distort_point(x as f64, y as f64);
        let sx = x as f64 + self.offset.x - (u - x as f64);
        let sy = y as f64 + self.offset.y - (v - y as f64);
        (sx as f32, sy as f32)
    }
}

/// Render pass that previews a scene as seen through the distorted lens
///
/// The pass owns one remap program and one offscreen target sized so the
/// full undistorted field of view fits without clipping. Scene content is
/// recorded between [`DistortPass::begin`] and [`DistortPass::end`] (or in a
/// [`DistortPass::with_camera`] closure) and composited to the current
/// surface with [`DistortPass::draw`].
///
/// Brackets must not be nested or interleaved with another pass on the same
/// context; the context's matrix and viewport stacks are shared state.
pub struct DistortPass<C: RenderContext> {
    profile: LensProfile,
    geometry: OutputGeometry,
    program: C::Program,
    target: C::Target,
    recording: bool,
    completed: bool,
}

impl<C: RenderContext> DistortPass<C> {
    /// Create a distort pass for a lens profile, allocating its offscreen
    /// target and compiling its remap program.
    ///
    /// The profile is copied; the pass does not observe later changes to the
    /// caller's copy.
    ///
    /// # Errors
    ///
    /// * The offscreen target cannot be allocated.
    /// * The remap program fails to compile.
    pub fn new(ctx: &mut C, profile: &LensProfile) -> Result<Self, RenderError> {
        let geometry = OutputGeometry::from_profile(profile);
        let (width, height) = geometry.target_size();
        log::debug!(
            "distort target {}x{} for nominal {}x{}",
            width,
            height,
            profile.width,
            profile.height
        );
        let target = ctx.create_target(width, height)?;
        let program =
            ctx.compile_program(Box::new(DistortKernel::new(profile.clone(), &geometry)))?;

        Ok(Self {
            profile: profile.clone(),
            geometry,
            program,
            target,
            recording: false,
            completed: false,
        })
    }

    /// The output geometry derived from the profile.
    pub fn geometry(&self) -> &OutputGeometry {
        &self.geometry
    }

    /// The lens profile the pass was built from.
    pub fn profile(&self) -> &LensProfile {
        &self.profile
    }

    /// The offscreen target handle.
    pub fn target(&self) -> C::Target {
        self.target
    }

    /// Start recording scene content into the offscreen target.
    ///
    /// Overrides the viewport to the target extent and rescales the active
    /// projection by the geometry's `projection_scale` so the recorded scene
    /// covers the full distorted-capable extent.
    ///
    /// # Panics
    ///
    /// Panics if the pass is already recording.
    pub fn begin(&mut self, ctx: &mut C) {
        assert!(!self.recording, "begin called while already recording");
        self.recording = true;
        self.enter(ctx);
        self.rescale_projection(ctx);
    }

    /// Stop recording, restoring the viewport and matrix state.
    ///
    /// # Panics
    ///
    /// Panics if the pass is not recording.
    pub fn end(&mut self, ctx: &mut C) {
        assert!(self.recording, "end called without a matching begin");
        self.leave(ctx);
        self.recording = false;
        self.completed = true;
    }

    /// Record scene content with an externally supplied camera.
    ///
    /// The camera's own begin/end bracket is nested inside the pass bracket;
    /// the projection the camera establishes is rescaled the same way
    /// [`DistortPass::begin`] rescales the ambient one.
    ///
    /// # Panics
    ///
    /// Panics if the pass is already recording.
    pub fn with_camera<K: ViewCamera<C>>(
        &mut self,
        ctx: &mut C,
        camera: &mut K,
        f: impl FnOnce(&mut C),
    ) {
        assert!(!self.recording, "begin called while already recording");
        self.recording = true;
        self.enter(ctx);
        camera.begin(ctx);
        self.rescale_projection(ctx);

        f(ctx);

        camera.end(ctx);
        self.leave(ctx);
        self.recording = false;
        self.completed = true;
    }

    /// Composite the recorded content to the current surface at `(x, y)`
    /// with the nominal frame size.
    ///
    /// # Panics
    ///
    /// Panics if the pass is recording or nothing has been recorded yet.
    pub fn draw(&self, ctx: &mut C, x: f32, y: f32) {
        self.draw_sized(
            ctx,
            x,
            y,
            self.profile.width as f32,
            self.profile.height as f32,
        );
    }

    /// Composite the recorded content to the current surface at `(x, y)`
    /// with an explicit quad size.
    ///
    /// Texture coordinates span the nominal frame extent regardless of the
    /// quad size; the fragment stage offsets them into the oversized buffer.
    ///
    /// # Panics
    ///
    /// Panics if the pass is recording or nothing has been recorded yet.
    pub fn draw_sized(&self, ctx: &mut C, x: f32, y: f32, width: f32, height: f32) {
        assert!(!self.recording, "draw called while recording");
        assert!(
            self.completed,
            "draw called before the first begin/end cycle"
        );
        ctx.draw_target_quad(
            self.target,
            self.program,
            x,
            y,
            width,
            height,
            (self.profile.width as f32, self.profile.height as f32),
        );
    }

    fn enter(&self, ctx: &mut C) {
        ctx.begin_target(self.target);
        ctx.push_view();
        let (width, height) = self.geometry.target_size();
        ctx.set_viewport(0, 0, width, height);
        ctx.push_matrix();
    }

    fn leave(&self, ctx: &mut C) {
        ctx.pop_matrix();
        ctx.pop_view();
        ctx.end_target(self.target);
    }

    fn rescale_projection(&self, ctx: &mut C) {
        let scale = Mat4::from_scale(Vec3::new(
            self.geometry.projection_scale.x as f32,
            self.geometry.projection_scale.y as f32,
            1.0,
        ));
        let rescaled = scale * ctx.projection_matrix();
        ctx.load_projection_matrix(rescaled);
    }
}
