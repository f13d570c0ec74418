use crate::error::{LocateError, LocateResult};
use image::GrayImage;
use objrec_brief::{BriefGenerator, BriefPattern};
use objrec_core::{Descriptor, FeatureConfig, Image, Keypoint};
use objrec_fast::{min_level_size, validate_config, FastDetector, ImagePyramid};

/// Keypoints with their descriptors, index-aligned
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Level coordinate to base coordinate, pixel centers aligned the way the
/// pyramid downsampler samples them
fn level_to_base(coord: f32, ratio: f32) -> f32 {
    (coord + 0.5) * ratio - 0.5
}

/// Multi-scale FAST detection plus BRIEF description
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    pattern: BriefPattern,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> LocateResult<Self> {
        validate_config(&config)?;
        let pattern = BriefPattern::generate(config.pattern_seed, config.patch_size);
        Ok(Self { config, pattern })
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Detect and describe features over the image pyramid.
    ///
    /// Output is deterministic for identical pixels. Images too small for a
    /// single detection window give an empty set.
    pub fn extract(&self, gray: &GrayImage) -> LocateResult<FeatureSet> {
        let (width, height) = (gray.width() as usize, gray.height() as usize);
        let cfg = &self.config;

        let levels = ImagePyramid::generate_scale_levels(
            width,
            height,
            cfg.n_levels,
            cfg.scale_factor,
            min_level_size(cfg),
        )?;
        if levels.is_empty() {
            tracing::debug!(width, height, "image smaller than the detection window");
            return Ok(FeatureSet::default());
        }

        let pyramid = ImagePyramid::build_image_pyramid(gray.as_raw(), width, height, &levels)?;
        let budget = ImagePyramid::features_per_level(cfg.max_features, &levels);

        let mut features = FeatureSet::default();
        for ((level, img), &max_features) in levels.iter().zip(&pyramid).zip(&budget) {
            if max_features == 0 {
                continue;
            }

            let detector = FastDetector::new(cfg.clone(), level.width, level.height)?;
            let keypoints = detector.detect_keypoints(img, max_features)?;
            if keypoints.is_empty() {
                continue;
            }

            let smoothed = self.smooth(img, level.width, level.height)?;
            let generator = BriefGenerator::new(level.width, level.height, self.pattern.clone(), cfg.descriptor);
            let descriptors = generator.generate_descriptors(&smoothed, &keypoints);

            tracing::trace!(
                level = level.level,
                width = level.width,
                height = level.height,
                keypoints = keypoints.len(),
                "pyramid level described"
            );

            let (rx, ry) = (width as f32 / level.width as f32, height as f32 / level.height as f32);
            features.keypoints.extend(keypoints.into_iter().map(|kp| Keypoint {
                x: level_to_base(kp.x, rx),
                y: level_to_base(kp.y, ry),
                size: kp.size * level.scale,
                octave: level.level as u8,
                ..kp
            }));
            features.descriptors.extend(descriptors);
        }

        Ok(features)
    }

    fn smooth(&self, img: &Image, width: usize, height: usize) -> LocateResult<Image> {
        if self.config.blur_sigma <= 0.0 {
            return Ok(img.clone());
        }
        let level = GrayImage::from_raw(width as u32, height as u32, img.clone()).ok_or(
            LocateError::InvalidFrame {
                width: width as u32,
                height: height as u32,
                expected_len: width * height,
                actual_len: img.len(),
            },
        )?;
        Ok(imageproc::filter::gaussian_blur_f32(&level, self.config.blur_sigma).into_raw())
    }
}
