use glam::Mat4;

use crate::error::RenderError;

/// A per-pixel coordinate remap evaluated in the fragment stage
///
/// A kernel describes the same remap twice: as WGSL fragment source with a
/// flat uniform block for GPU backends, and as a direct evaluation for the
/// software backend and for host-side math. Both views must agree; the
/// fragment source is the portable contract, not a backend detail.
pub trait RemapKernel: Send + Sync {
    /// The WGSL fragment source implementing the remap.
    fn fragment_source(&self) -> String;

    /// The uniform block contents, flattened in the order the fragment
    /// source declares them.
    fn uniform_data(&self) -> Vec<f32>;

    /// Evaluate the remap: the source sampling location for the output
    /// location `(x, y)`, both in pixel coordinates.
    fn map(&self, x: f32, y: f32) -> (f32, f32);
}

/// The graphics-context collaborator the render passes require
///
/// The contract is deliberately small: offscreen color targets, remap-program
/// compilation, a saved/restored view (viewport + projection) and model
/// matrix stack, and textured quad draws. Device and window-system management
/// stay with the implementor. Programs and targets are plain handles owned by
/// the context; a pass holds the handles for the resources it created.
///
/// All operations are synchronous and must be called from the thread owning
/// the context.
pub trait RenderContext {
    /// Handle to a compiled remap program.
    type Program: Copy;
    /// Handle to an offscreen color target.
    type Target: Copy;

    /// Allocate an offscreen color target of the given pixel dimensions.
    fn create_target(&mut self, width: u32, height: u32) -> Result<Self::Target, RenderError>;

    /// The pixel dimensions of a target.
    fn target_size(&self, target: Self::Target) -> (u32, u32);

    /// Compile a remap kernel into a program.
    fn compile_program(
        &mut self,
        kernel: Box<dyn RemapKernel>,
    ) -> Result<Self::Program, RenderError>;

    /// Redirect subsequent draws into the target, saving the surface state.
    fn begin_target(&mut self, target: Self::Target);

    /// End drawing into the target, restoring the previous surface state.
    fn end_target(&mut self, target: Self::Target);

    /// Save the current viewport and projection.
    fn push_view(&mut self);

    /// Restore the most recently saved viewport and projection.
    fn pop_view(&mut self);

    /// Set the current viewport rectangle.
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Save the current model matrix.
    fn push_matrix(&mut self);

    /// Restore the most recently saved model matrix.
    fn pop_matrix(&mut self);

    /// Read back the current projection matrix.
    fn projection_matrix(&self) -> Mat4;

    /// Replace the current projection matrix.
    fn load_projection_matrix(&mut self, projection: Mat4);

    /// Bind a program so it applies to subsequent draws.
    fn bind_program(&mut self, program: Self::Program);

    /// Unbind the currently bound program.
    fn unbind_program(&mut self);

    /// Draw a quad at `(x, y)` of size `(width, height)` textured with the
    /// target's color attachment, with texture coordinates spanning
    /// `(0, 0)` to `tex_extent` and the fragment stage running `program`.
    #[allow(clippy::too_many_arguments)]
    fn draw_target_quad(
        &mut self,
        target: Self::Target,
        program: Self::Program,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        tex_extent: (f32, f32),
    );
}

/// An externally supplied camera whose own begin/end bracket is nested
/// inside a pass's bracket.
pub trait ViewCamera<C: RenderContext> {
    /// Apply the camera's view and projection to the context.
    fn begin(&mut self, ctx: &mut C);

    /// Undo what [`ViewCamera::begin`] applied.
    fn end(&mut self, ctx: &mut C);
}
