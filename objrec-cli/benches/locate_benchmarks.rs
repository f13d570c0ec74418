use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{GrayImage, Luma};
use objrec_cli::{FeatureExtractor, LocatorConfig, ObjectLocator, ReferenceModel};

/// Bright squares of varying intensity on a gradient
fn create_reference(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let (cx, cy) = (x % 24, y % 24);
        if (6..16).contains(&cx) && (6..16).contains(&cy) {
            Luma([150 + ((x / 24 * 37 + y / 24 * 53) % 100) as u8])
        } else {
            Luma([70 + (x * 40 / width) as u8])
        }
    })
}

fn create_frame(reference: &GrayImage, width: u32, height: u32) -> GrayImage {
    let mut frame = GrayImage::from_pixel(width, height, Luma([70]));
    image::imageops::replace(&mut frame, reference, 120, 80);
    frame
}

fn bench_locate(c: &mut Criterion) {
    let config = LocatorConfig::default();
    let extractor = FeatureExtractor::new(config.features.clone()).unwrap();
    let reference = create_reference(320, 240);
    let model = ReferenceModel::from_image(&reference, &extractor).unwrap();
    let locator = ObjectLocator::new(extractor.clone(), model, &config);
    let frame = create_frame(&reference, 640, 480);

    c.bench_function("extract_640x480", |b| b.iter(|| extractor.extract(black_box(&frame)).unwrap()));
    c.bench_function("locate_640x480", |b| b.iter(|| locator.locate(black_box(&frame)).unwrap()));
}

criterion_group!(benches, bench_locate);
criterion_main!(benches);
