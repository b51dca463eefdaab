use argh::FromArgs;
use glam::Mat4;
use std::path::PathBuf;

use unwarp::camera::{CameraMatrix, DistortionCoefficients, LensProfile};
use unwarp::render::{DistortPass, Frame, RenderContext, SoftwareContext, ViewCamera};

#[derive(FromArgs)]
/// Render a grid through a distorting lens to preview the projection
struct Args {
    /// nominal frame width
    #[argh(option, default = "640")]
    width: usize,

    /// nominal frame height
    #[argh(option, default = "480")]
    height: usize,

    /// first radial distortion coefficient
    #[argh(option, default = "-0.2")]
    k1: f64,

    /// path to write the preview image
    #[argh(option, short = 'o')]
    output_path: PathBuf,
}

/// Screen-space camera for the nominal frame: world coordinates `0..width`
/// and `0..height` fill whatever viewport is active.
struct ScreenCamera {
    width: f32,
    height: f32,
}

impl ViewCamera<SoftwareContext> for ScreenCamera {
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

fn grid_pattern(width: usize, height: usize, spacing: usize) -> Frame {
    let mut frame = Frame::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let on_line = x % spacing == 0 || y % spacing == 0;
            let value = if on_line { 1.0 } else { 0.1 };
            frame.set_pixel(x, y, [value, value, value, 1.0]);
        }
    }
    frame
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let profile = LensProfile::new(
        args.width,
        args.height,
        CameraMatrix::new(
            args.width as f64,
            args.height as f64,
            args.width as f64 / 2.0,
            args.height as f64 / 2.0,
        ),
        DistortionCoefficients::from_slice(&[args.k1]),
    );

    let pattern = grid_pattern(args.width, args.height, 40);

    let mut ctx = SoftwareContext::new(args.width, args.height);
    let mut pass = DistortPass::new(&mut ctx, &profile)?;
    let mut camera = ScreenCamera {
        width: args.width as f32,
        height: args.height as f32,
    };

    pass.with_camera(&mut ctx, &mut camera, |ctx| {
        ctx.draw_frame(&pattern, 0.0, 0.0);
    });
    pass.draw(&mut ctx, 0.0, 0.0);

    let preview = ctx.screen();
    let mut out = image::RgbaImage::new(args.width as u32, args.height as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let p = preview.pixel(x as usize, y as usize);
        *pixel = image::Rgba(p.map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8));
    }
    out.save(&args.output_path)?;

    Ok(())
}
