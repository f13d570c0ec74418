use image::{GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use objrec_cli::LocatorConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;

pub const BACKGROUND: u8 = 110;

/// Overlapping rectangles of random intensity on a mid-gray field.
///
/// Rectangle corners and T-junctions give FAST plenty to fire on.
pub fn textured_reference(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));

    for _ in 0..(width * height / 400) {
        let w = rng.gen_range(6..24);
        let h = rng.gen_range(6..24);
        let x0 = rng.gen_range(0..width - w);
        let y0 = rng.gen_range(0..height - h);
        let value: u8 = rng.gen();
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([value]));
            }
        }
    }
    img
}

/// Place `object` at (`dx`, `dy`) inside a uniform frame
pub fn paste(object: &GrayImage, frame_width: u32, frame_height: u32, dx: u32, dy: u32) -> GrayImage {
    let mut frame = GrayImage::from_pixel(frame_width, frame_height, Luma([BACKGROUND]));
    image::imageops::replace(&mut frame, object, dx as i64, dy as i64);
    frame
}

pub fn to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

pub fn encode_png(gray: &GrayImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    to_rgb(gray)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encoding");
    bytes
}

pub fn to_bgr8(gray: &GrayImage) -> Vec<u8> {
    gray.pixels().flat_map(|p| [p[0], p[0], p[0]]).collect()
}

/// Single level and a generous budget so every reference keypoint survives
/// in the frame.
pub fn single_level_config() -> LocatorConfig {
    let mut config = LocatorConfig::default();
    config.features.n_levels = 1;
    config.features.max_features = 5000;
    config.features.n_threads = 1;
    config
}

/// Full pyramid with the same generous budget
pub fn pyramid_config() -> LocatorConfig {
    let mut config = single_level_config();
    config.features.n_levels = 4;
    config
}
