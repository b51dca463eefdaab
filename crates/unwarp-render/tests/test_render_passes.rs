use glam::Mat4;

use unwarp_camera::{CameraMatrix, DistortionCoefficients, LensProfile};
use unwarp_render::{
    DistortPass, Frame, RenderContext, SoftwareContext, UndistortPass, ViewCamera,
};

/// Test camera establishing a screen-space projection for the nominal frame
/// over whatever viewport is active.
struct NominalCamera {
    width: f32,
    height: f32,
}

impl ViewCamera<SoftwareContext> for NominalCamera {
    fn begin(&mut self, ctx: &mut SoftwareContext) {
        ctx.load_projection_matrix(Mat4::orthographic_rh(
            0.0,
            self.width,
            self.height,
            0.0,
            -1.0,
            1.0,
        ));
    }

    fn end(&mut self, _ctx: &mut SoftwareContext) {}
}

fn profile(coeffs: &[f64]) -> LensProfile {
    LensProfile::new(
        640,
        480,
        CameraMatrix::new(640.0, 480.0, 320.0, 240.0),
        DistortionCoefficients::from_slice(coeffs),
    )
}

fn gradient_pattern(width: usize, height: usize) -> Frame {
    let mut frame = Frame::new(width, height);
    for y in 0..height {
        for x in 0..width {
            frame.set_pixel(
                x,
                y,
                [x as f32 / width as f32, y as f32 / height as f32, 0.5, 1.0],
            );
        }
    }
    frame
}

#[test]
fn zero_distortion_distort_is_a_passthrough() {
    let profile = profile(&[]);
    let mut ctx = SoftwareContext::new(640, 480);
    let pattern = gradient_pattern(640, 480);

    let mut pass = DistortPass::new(&mut ctx, &profile).unwrap();
    assert_eq!(pass.geometry().target_size(), (640, 480));

    pass.begin(&mut ctx);
    ctx.draw_frame(&pattern, 0.0, 0.0);
    pass.end(&mut ctx);
    pass.draw(&mut ctx, 0.0, 0.0);

    for (a, b) in ctx.screen().as_slice().iter().zip(pattern.as_slice()) {
        assert!((a - b).abs() < 1e-3);
    }
}

#[test]
fn distort_then_undistort_restores_the_pattern() {
    let profile = profile(&[-0.03]);
    let mut ctx = SoftwareContext::new(640, 480);
    let pattern = gradient_pattern(640, 480);

    let mut distort = DistortPass::new(&mut ctx, &profile).unwrap();
    let mut camera = NominalCamera {
        width: 640.0,
        height: 480.0,
    };
    distort.with_camera(&mut ctx, &mut camera, |ctx| {
        ctx.draw_frame(&pattern, 0.0, 0.0);
    });
    distort.draw(&mut ctx, 0.0, 0.0);

    let distorted = ctx.screen().clone();

    // the distorted render must actually differ from the pattern off-center
    let moved = distorted.pixel(20, 20);
    let original = pattern.pixel(20, 20);
    assert!((moved[0] - original[0]).abs() > 1e-3);

    ctx.clear([0.0; 4]);
    let mut undistort = UndistortPass::new(&mut ctx, &profile).unwrap();
    undistort.begin(&mut ctx);
    ctx.draw_frame(&distorted, 0.0, 0.0);
    undistort.end(&mut ctx);

    // away from the borders the round trip reproduces the pattern within
    // interpolation error
    for y in (40..440).step_by(7) {
        for x in (40..600).step_by(7) {
            let got = ctx.screen().pixel(x, y);
            let expected = pattern.pixel(x, y);
            for c in 0..3 {
                assert!(
                    (got[c] - expected[c]).abs() < 0.02,
                    "channel {c} off by {} at ({x}, {y})",
                    got[c] - expected[c]
                );
            }
        }
    }
}

#[test]
fn barrel_distortion_renders_extra_periphery() {
    let profile = profile(&[-0.3]);
    let mut ctx = SoftwareContext::new(640, 480);
    let pattern = gradient_pattern(640, 480);

    let mut pass = DistortPass::new(&mut ctx, &profile).unwrap();
    assert_eq!(pass.geometry().target_size(), (736, 552));

    let mut camera = NominalCamera {
        width: 640.0,
        height: 480.0,
    };
    pass.with_camera(&mut ctx, &mut camera, |ctx| {
        ctx.draw_frame(&pattern, 0.0, 0.0);
    });

    // the nominal frame lands inside the oversized buffer at -top_left
    let fb = ctx.target_frame(pass.target());
    let inner = fb.pixel(48 + 320, 36 + 240);
    let expected = pattern.pixel(320, 240);
    for c in 0..3 {
        assert!((inner[c] - expected[c]).abs() < 1e-3);
    }
}

#[test]
#[should_panic(expected = "begin called while already recording")]
fn double_begin_panics() {
    let profile = profile(&[-0.1]);
    let mut ctx = SoftwareContext::new(640, 480);
    let mut pass = DistortPass::new(&mut ctx, &profile).unwrap();

    pass.begin(&mut ctx);
    pass.begin(&mut ctx);
}

#[test]
#[should_panic(expected = "end called without a matching begin")]
fn end_without_begin_panics() {
    let profile = profile(&[-0.1]);
    let mut ctx = SoftwareContext::new(640, 480);
    let mut pass = DistortPass::new(&mut ctx, &profile).unwrap();

    pass.end(&mut ctx);
}

#[test]
#[should_panic(expected = "draw called before the first begin/end cycle")]
fn draw_before_first_cycle_panics() {
    let profile = profile(&[-0.1]);
    let mut ctx = SoftwareContext::new(640, 480);
    let pass = DistortPass::new(&mut ctx, &profile).unwrap();

    pass.draw(&mut ctx, 0.0, 0.0);
}

#[test]
#[should_panic(expected = "begin called while already active")]
fn undistort_double_begin_panics() {
    let profile = profile(&[-0.1]);
    let mut ctx = SoftwareContext::new(640, 480);
    let mut pass = UndistortPass::new(&mut ctx, &profile).unwrap();

    pass.begin(&mut ctx);
    pass.begin(&mut ctx);
}

#[test]
fn passes_copy_the_profile() {
    let mut ctx = SoftwareContext::new(640, 480);
    let mut source = profile(&[-0.1]);
    let pass = DistortPass::new(&mut ctx, &source).unwrap();

    source.distortion.k1 = 0.0;
    assert_eq!(pass.profile().distortion.k1, -0.1);
}
