use glam::{Mat4, Vec2, Vec4};
use rayon::prelude::*;

use crate::context::{RemapKernel, RenderContext};
use crate::error::RenderError;

const CHANNELS: usize = 4;

/// An RGBA `f32` pixel surface used by the software backend
///
/// Texel centers sit at half-integer coordinates; sampling outside the frame
/// returns transparent black.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl Frame {
    /// Create a transparent black frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height * CHANNELS],
        }
    }

    /// Create a frame from interleaved RGBA data.
    ///
    /// # Errors
    ///
    /// * The data length does not equal `width * height * 4`.
    pub fn from_data(width: usize, height: usize, data: Vec<f32>) -> Result<Self, RenderError> {
        if data.len() != width * height * CHANNELS {
            return Err(RenderError::InvalidFrameData(
                data.len(),
                width * height * CHANNELS,
            ));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// The frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The interleaved RGBA data.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// The interleaved RGBA data, mutable.
    pub fn as_slice_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// The pixel value at integer coordinates.
    pub fn pixel(&self, x: usize, y: usize) -> [f32; CHANNELS] {
        let base = (y * self.width + x) * CHANNELS;
        let mut out = [0.0; CHANNELS];
        out.copy_from_slice(&self.data[base..base + CHANNELS]);
        out
    }

    /// Set the pixel value at integer coordinates.
    pub fn set_pixel(&mut self, x: usize, y: usize, pixel: [f32; CHANNELS]) {
        let base = (y * self.width + x) * CHANNELS;
        self.data[base..base + CHANNELS].copy_from_slice(&pixel);
    }

    /// Fill every pixel with a color.
    pub fn fill(&mut self, color: [f32; CHANNELS]) {
        for pixel in self.data.chunks_exact_mut(CHANNELS) {
            pixel.copy_from_slice(&color);
        }
    }

    /// Bilinear sample at continuous pixel coordinates.
    pub fn sample(&self, u: f32, v: f32) -> [f32; CHANNELS] {
        let x = u - 0.5;
        let y = v - 0.5;
        let x0f = x.floor();
        let y0f = y.floor();
        let frac_u = x - x0f;
        let frac_v = y - y0f;
        let x0 = x0f as i64;
        let y0 = y0f as i64;

        let w00 = (1.0 - frac_u) * (1.0 - frac_v);
        let w01 = frac_u * (1.0 - frac_v);
        let w10 = (1.0 - frac_u) * frac_v;
        let w11 = frac_u * frac_v;

        let mut out = [0.0; CHANNELS];
        for (dx, dy, w) in [(0, 0, w00), (1, 0, w01), (0, 1, w10), (1, 1, w11)] {
            if let Some(texel) = self.texel(x0 + dx, y0 + dy) {
                for (o, t) in out.iter_mut().zip(texel) {
                    *o += w * t;
                }
            }
        }
        out
    }

    fn texel(&self, x: i64, y: i64) -> Option<&[f32]> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        let base = (y as usize * self.width + x as usize) * CHANNELS;
        Some(&self.data[base..base + CHANNELS])
    }
}

/// Handle to an offscreen target of a [`SoftwareContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetId(usize);

/// Handle to a compiled program of a [`SoftwareContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramId(usize);

type Viewport = (i32, i32, u32, u32);

/// CPU reference implementation of [`RenderContext`]
///
/// Surfaces are [`Frame`]s; programs execute their kernel's reference
/// evaluation per destination pixel, resampling rows in parallel. The
/// transform pipeline mirrors a fixed-function 2D context: model matrix,
/// projection matrix, viewport mapping, with screen-space orthographic
/// projections established per surface.
pub struct SoftwareContext {
    screen: Frame,
    targets: Vec<Frame>,
    programs: Vec<Box<dyn RemapKernel>>,
    bound_program: Option<ProgramId>,
    target_stack: Vec<(TargetId, Viewport, Mat4, Mat4)>,
    view_stack: Vec<(Viewport, Mat4)>,
    matrix_stack: Vec<Mat4>,
    viewport: Viewport,
    projection: Mat4,
    model: Mat4,
}

impl SoftwareContext {
    /// Create a context with a screen surface of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            screen: Frame::new(width, height),
            targets: Vec::new(),
            programs: Vec::new(),
            bound_program: None,
            target_stack: Vec::new(),
            view_stack: Vec::new(),
            matrix_stack: Vec::new(),
            viewport: (0, 0, width as u32, height as u32),
            projection: screen_ortho(width as f32, height as f32),
            model: Mat4::IDENTITY,
        }
    }

    /// The screen surface.
    pub fn screen(&self) -> &Frame {
        &self.screen
    }

    /// The color attachment of an offscreen target.
    pub fn target_frame(&self, target: TargetId) -> &Frame {
        &self.targets[target.0]
    }

    /// Fill the current surface with a color.
    pub fn clear(&mut self, color: [f32; CHANNELS]) {
        match self.target_stack.last().map(|(t, ..)| *t) {
            Some(t) => self.targets[t.0].fill(color),
            None => self.screen.fill(color),
        }
    }

    /// Draw a frame as a textured quad at `(x, y)` through the current
    /// transform, remapped by the bound program if one is bound.
    pub fn draw_frame(&mut self, frame: &Frame, x: f32, y: f32) {
        let p0 = self.project(x, y);
        let p1 = self.project(x + frame.width() as f32, y + frame.height() as f32);
        let tex_extent = (frame.width() as f32, frame.height() as f32);
        let kernel: Option<&dyn RemapKernel> = match self.bound_program {
            Some(p) => Some(&*self.programs[p.0]),
            None => None,
        };
        let viewport = self.viewport;
        let dst = match self.target_stack.last().map(|(t, ..)| *t) {
            Some(t) => &mut self.targets[t.0],
            None => &mut self.screen,
        };
        resample_quad(frame, dst, viewport, p0, p1, tex_extent, kernel);
    }

    fn project(&self, x: f32, y: f32) -> Vec2 {
        let clip = self.projection * self.model * Vec4::new(x, y, 0.0, 1.0);
        let ndc = Vec2::new(clip.x / clip.w, clip.y / clip.w);
        let (vx, vy, vw, vh) = self.viewport;
        Vec2::new(
            vx as f32 + (ndc.x + 1.0) * 0.5 * vw as f32,
            vy as f32 + (1.0 - ndc.y) * 0.5 * vh as f32,
        )
    }
}

impl RenderContext for SoftwareContext {
    type Program = ProgramId;
    type Target = TargetId;

    fn create_target(&mut self, width: u32, height: u32) -> Result<TargetId, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTargetSize(width, height));
        }
        self.targets.push(Frame::new(width as usize, height as usize));
        Ok(TargetId(self.targets.len() - 1))
    }

    fn target_size(&self, target: TargetId) -> (u32, u32) {
        let frame = &self.targets[target.0];
        (frame.width() as u32, frame.height() as u32)
    }

    fn compile_program(
        &mut self,
        kernel: Box<dyn RemapKernel>,
    ) -> Result<ProgramId, RenderError> {
        if kernel.fragment_source().is_empty() {
            return Err(RenderError::ProgramCompile(
                "empty fragment source".to_string(),
            ));
        }
        self.programs.push(kernel);
        Ok(ProgramId(self.programs.len() - 1))
    }

    fn begin_target(&mut self, target: TargetId) {
        self.target_stack
            .push((target, self.viewport, self.projection, self.model));
        let frame = &self.targets[target.0];
        let (width, height) = (frame.width(), frame.height());
        self.viewport = (0, 0, width as u32, height as u32);
        self.projection = screen_ortho(width as f32, height as f32);
        self.model = Mat4::IDENTITY;
    }

    fn end_target(&mut self, target: TargetId) {
        let (top, viewport, projection, model) = self
            .target_stack
            .pop()
            .expect("end_target without a matching begin_target");
        assert_eq!(top, target, "end_target does not match the bound target");
        self.viewport = viewport;
        self.projection = projection;
        self.model = model;
    }

    fn push_view(&mut self) {
        self.view_stack.push((self.viewport, self.projection));
    }

    fn pop_view(&mut self) {
        let (viewport, projection) = self
            .view_stack
            .pop()
            .expect("pop_view without a matching push_view");
        self.viewport = viewport;
        self.projection = projection;
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn push_matrix(&mut self) {
        self.matrix_stack.push(self.model);
    }

    fn pop_matrix(&mut self) {
        self.model = self
            .matrix_stack
            .pop()
            .expect("pop_matrix without a matching push_matrix");
    }

    fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    fn load_projection_matrix(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    fn bind_program(&mut self, program: ProgramId) {
        assert!(program.0 < self.programs.len());
        self.bound_program = Some(program);
    }

    fn unbind_program(&mut self) {
        self.bound_program = None;
    }

    fn draw_target_quad(
        &mut self,
        target: TargetId,
        program: ProgramId,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        tex_extent: (f32, f32),
    ) {
        let p0 = self.project(x, y);
        let p1 = self.project(x + width, y + height);
        let kernel: Option<&dyn RemapKernel> = Some(&*self.programs[program.0]);
        let viewport = self.viewport;

        match self.target_stack.last().map(|(t, ..)| *t) {
            None => {
                let src = &self.targets[target.0];
                resample_quad(src, &mut self.screen, viewport, p0, p1, tex_extent, kernel);
            }
            Some(current) => {
                assert_ne!(
                    current.0, target.0,
                    "cannot draw a target into itself while it is bound"
                );
                let split = current.0.max(target.0);
                let (lo, hi) = self.targets.split_at_mut(split);
                let (src, dst) = if target.0 < current.0 {
                    (&lo[target.0], &mut hi[0])
                } else {
                    (&hi[0], &mut lo[current.0])
                };
                resample_quad(src, dst, viewport, p0, p1, tex_extent, kernel);
            }
        }
    }
}

fn screen_ortho(width: f32, height: f32) -> Mat4 {
    Mat4::orthographic_rh(0.0, width, height, 0.0, -1.0, 1.0)
}

#[allow(clippy::too_many_arguments)]
fn resample_quad(
    src: &Frame,
    dst: &mut Frame,
    viewport: Viewport,
    p0: Vec2,
    p1: Vec2,
    tex_extent: (f32, f32),
    kernel: Option<&dyn RemapKernel>,
) {
    let span = p1 - p0;
    if span.x <= 0.0 || span.y <= 0.0 {
        return;
    }

    let (vx, vy, vw, vh) = viewport;
    let x_lo = p0.x.max(vx as f32).max(0.0).floor() as usize;
    let y_lo = p0.y.max(vy as f32).max(0.0).floor() as usize;
    let x_hi = p1
        .x
        .min((vx + vw as i32) as f32)
        .min(dst.width as f32)
        .ceil()
        .max(0.0) as usize;
    let y_hi = p1
        .y
        .min((vy + vh as i32) as f32)
        .min(dst.height as f32)
        .ceil()
        .max(0.0) as usize;
    if x_lo >= x_hi || y_lo >= y_hi {
        return;
    }

    let width = dst.width;
    dst.data
        .par_chunks_exact_mut(width * CHANNELS)
        .enumerate()
        .skip(y_lo)
        .take(y_hi - y_lo)
        .for_each(|(j, row)| {
            let ty = ((j as f32 + 0.5) - p0.y) / span.y;
            if !(0.0..1.0).contains(&ty) {
                return;
            }
            let v = ty * tex_extent.1;
            for i in x_lo..x_hi {
                let tx = ((i as f32 + 0.5) - p0.x) / span.x;
                if !(0.0..1.0).contains(&tx) {
                    continue;
                }
                let u = tx * tex_extent.0;
                let (su, sv) = match kernel {
                    Some(k) => k.map(u, v),
                    None => (u, v),
                };
                let pixel = src.sample(su, sv);
                row[i * CHANNELS..(i + 1) * CHANNELS].copy_from_slice(&pixel);
            }
        });
}
