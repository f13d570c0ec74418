use objrec_core::{Descriptor, DescriptorKind, Image, Keypoint, DESCRIPTOR_BYTES};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

/// One intensity comparison per descriptor bit
pub const BRIEF_PAIRS: usize = DESCRIPTOR_BYTES * 8;

/// Point-pair sampling pattern, offsets relative to the keypoint
#[derive(Debug, Clone, PartialEq)]
pub struct BriefPattern {
    pairs: Vec<(i32, i32, i32, i32)>,
    radius: i32,
}

impl BriefPattern {
    /// Draw `BRIEF_PAIRS` pairs uniformly from the disc that fits a
    /// `patch_size` patch with a 2-pixel margin. Same seed, same pattern.
    pub fn generate(seed: u64, patch_size: usize) -> Self {
        let radius = ((patch_size / 2) as i32 - 2).max(1);
        let mut rng = StdRng::seed_from_u64(seed);

        let mut sample_point = |rng: &mut StdRng| loop {
            let x = rng.gen_range(-radius..=radius);
            let y = rng.gen_range(-radius..=radius);
            if x * x + y * y <= radius * radius {
                return (x, y);
            }
        };

        let mut pairs = Vec::with_capacity(BRIEF_PAIRS);
        while pairs.len() < BRIEF_PAIRS {
            let (x1, y1) = sample_point(&mut rng);
            let (x2, y2) = sample_point(&mut rng);
            if (x1, y1) != (x2, y2) {
                pairs.push((x1, y1, x2, y2));
            }
        }

        Self { pairs, radius }
    }

    pub fn pairs(&self) -> &[(i32, i32, i32, i32)] {
        &self.pairs
    }

    /// Largest distance of any sample from the keypoint, under any rotation
    pub fn radius(&self) -> i32 {
        self.radius
    }
}

pub struct BriefGenerator {
    w: usize,
    h: usize,
    pattern: BriefPattern,
    steered: bool,
}

impl BriefGenerator {
    pub fn new(width: usize, height: usize, pattern: BriefPattern, kind: DescriptorKind) -> Self {
        assert!(width > 0 && height > 0);
        Self {
            w: width,
            h: height,
            pattern,
            steered: kind == DescriptorKind::OrientedBrief,
        }
    }

    /// One descriptor per keypoint, in keypoint order.
    ///
    /// Keypoint coordinates are in this generator's image. Samples falling
    /// outside the image are clamped to the nearest edge pixel.
    pub fn generate_descriptors(&self, img: &Image, kps: &[Keypoint]) -> Vec<Descriptor> {
        tracing::trace!(keypoints = kps.len(), steered = self.steered, "computing BRIEF descriptors");
        kps.par_iter()
            .map(|kp| {
                let angle = if self.steered { kp.angle } else { 0.0 };
                let (s, c) = angle.sin_cos();
                let (cx, cy) = (kp.x, kp.y);
                let mut d = [0u8; DESCRIPTOR_BYTES];

                for (i, &(dx1, dy1, dx2, dy2)) in self.pattern.pairs.iter().enumerate() {
                    let (rx1, ry1) = (
                        cx + c * dx1 as f32 - s * dy1 as f32,
                        cy + s * dx1 as f32 + c * dy1 as f32,
                    );
                    let (rx2, ry2) = (
                        cx + c * dx2 as f32 - s * dy2 as f32,
                        cy + s * dx2 as f32 + c * dy2 as f32,
                    );

                    let val1 = self.bilinear_sample(img, rx1, ry1);
                    let val2 = self.bilinear_sample(img, rx2, ry2);

                    let bit = (val1 < val2) as u8;
                    d[i / 8] |= bit << (i % 8);
                }
                d
            })
            .collect()
    }

    /// Bilinear interpolation for subpixel sampling
    fn bilinear_sample(&self, img: &Image, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let x1 = x0 + 1.0;
        let y1 = y0 + 1.0;

        if x0 < 0.0 || y0 < 0.0 || x1 >= self.w as f32 || y1 >= self.h as f32 {
            let cx = x.round().clamp(0.0, (self.w - 1) as f32) as usize;
            let cy = y.round().clamp(0.0, (self.h - 1) as f32) as usize;
            return img[cy * self.w + cx] as f32;
        }

        let dx = x - x0;
        let dy = y - y0;

        let x0_idx = x0 as usize;
        let y0_idx = y0 as usize;
        let x1_idx = x1 as usize;
        let y1_idx = y1 as usize;

        let p00 = img[y0_idx * self.w + x0_idx] as f32;
        let p10 = img[y0_idx * self.w + x1_idx] as f32;
        let p01 = img[y1_idx * self.w + x0_idx] as f32;
        let p11 = img[y1_idx * self.w + x1_idx] as f32;

        let top = p00 * (1.0 - dx) + p10 * dx;
        let bottom = p01 * (1.0 - dx) + p11 * dx;

        top * (1.0 - dy) + bottom * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objrec_core::hamming_distance;

    fn noise_image(width: usize, height: usize, seed: u64) -> Image {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..width * height).map(|_| rng.gen()).collect()
    }

    /// Rotate a square image by 90 degrees clockwise
    fn rotate_cw(img: &Image, size: usize) -> Image {
        let mut out = vec![0u8; size * size];
        for yn in 0..size {
            for xn in 0..size {
                out[yn * size + xn] = img[(size - 1 - xn) * size + yn];
            }
        }
        out
    }

    fn keypoint(x: f32, y: f32, angle: f32) -> Keypoint {
        Keypoint { angle, ..Keypoint::new(x, y) }
    }

    #[test]
    fn test_pattern_is_seeded() {
        let a = BriefPattern::generate(7, 31);
        let b = BriefPattern::generate(7, 31);
        let c = BriefPattern::generate(8, 31);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.pairs().len(), BRIEF_PAIRS);
    }

    #[test]
    fn test_pattern_fits_patch() {
        let pattern = BriefPattern::generate(1, 31);
        assert_eq!(pattern.radius(), 13);
        for &(x1, y1, x2, y2) in pattern.pairs() {
            assert!(x1 * x1 + y1 * y1 <= 169);
            assert!(x2 * x2 + y2 * y2 <= 169);
            assert_ne!((x1, y1), (x2, y2));
        }
    }

    #[test]
    fn test_same_patch_same_descriptor() {
        let img = noise_image(64, 64, 3);
        let gen = BriefGenerator::new(64, 64, BriefPattern::generate(1, 31), DescriptorKind::OrientedBrief);
        let kps = [keypoint(32.0, 32.0, 0.4), keypoint(32.0, 32.0, 0.4), keypoint(20.0, 40.0, 0.0)];
        let desc = gen.generate_descriptors(&img, &kps);
        assert_eq!(desc.len(), 3);
        assert_eq!(hamming_distance(&desc[0], &desc[1]), 0);
        assert!(hamming_distance(&desc[0], &desc[2]) > 0);
    }

    #[test]
    fn test_uniform_patch_gives_zero_descriptor() {
        let img = vec![90u8; 40 * 40];
        let gen = BriefGenerator::new(40, 40, BriefPattern::generate(1, 31), DescriptorKind::Brief);
        let desc = gen.generate_descriptors(&img, &[keypoint(20.0, 20.0, 0.0)]);
        assert_eq!(desc[0], [0u8; DESCRIPTOR_BYTES]);
    }

    #[test]
    fn test_unsteered_ignores_angle() {
        let img = noise_image(64, 64, 5);
        let gen = BriefGenerator::new(64, 64, BriefPattern::generate(2, 31), DescriptorKind::Brief);
        let desc = gen.generate_descriptors(&img, &[keypoint(32.0, 32.0, 0.0), keypoint(32.0, 32.0, 1.3)]);
        assert_eq!(desc[0], desc[1]);
    }

    #[test]
    fn test_steered_follows_rotation() {
        let size = 64;
        let img = noise_image(size, size, 11);
        let rotated = rotate_cw(&img, size);
        let pattern = BriefPattern::generate(4, 31);

        let gen = BriefGenerator::new(size, size, pattern, DescriptorKind::OrientedBrief);
        let original = gen.generate_descriptors(&img, &[keypoint(32.0, 32.0, 0.25)]);
        // (32, 32) lands on (size - 1 - 32, 32) and the patch turns by a quarter
        let turned = gen.generate_descriptors(
            &rotated,
            &[keypoint(31.0, 32.0, 0.25 + std::f32::consts::FRAC_PI_2)],
        );
        let dist = hamming_distance(&original[0], &turned[0]);
        assert!(dist < 16, "rotated descriptor differs in {} bits", dist);
    }

    #[test]
    fn test_border_keypoints_are_clamped() {
        let img = noise_image(32, 32, 9);
        let gen = BriefGenerator::new(32, 32, BriefPattern::generate(1, 31), DescriptorKind::OrientedBrief);
        let desc = gen.generate_descriptors(&img, &[keypoint(0.0, 0.0, 2.0), keypoint(31.0, 31.0, -1.0)]);
        assert_eq!(desc.len(), 2);
    }
}
