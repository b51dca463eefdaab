use argh::FromArgs;
use std::path::PathBuf;

use unwarp::camera::LensProfile;
use unwarp::render::{Frame, SoftwareContext, UndistortPass};

#[derive(FromArgs)]
/// Undistort an image with a JSON lens profile
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// path to a JSON lens profile
    #[argh(option, short = 'p')]
    profile_path: PathBuf,

    /// path to write the corrected image
    #[argh(option, short = 'o')]
    output_path: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let profile = LensProfile::from_json_file(&args.profile_path)?;

    let img = image::open(&args.image_path)?.to_rgba32f();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let frame = Frame::from_data(width, height, img.into_raw())?;

    let mut ctx = SoftwareContext::new(width, height);
    let mut pass = UndistortPass::new(&mut ctx, &profile)?;

    pass.begin(&mut ctx);
    ctx.draw_frame(&frame, 0.0, 0.0);
    pass.end(&mut ctx);

    let corrected = ctx.screen();
    let mut out = image::RgbaImage::new(width as u32, height as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let p = corrected.pixel(x as usize, y as usize);
        *pixel = image::Rgba(p.map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8));
    }
    out.save(&args.output_path)?;

    Ok(())
}
