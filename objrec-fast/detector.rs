use objrec_core::{DetectorKind, FeatureConfig, Image, Keypoint};
use crate::corner_detection::{CornerDetector, HARRIS_BLOCK_SIZE};
use crate::error::{FastError, FastResult};
use crate::refinement::KeypointRefinement;
use crate::types::ScoredKeypoint;
use rayon::prelude::*;

/// FAST requires at least 7x7 image (3-pixel border on each side)
pub const MIN_IMAGE_SIZE: usize = 7;

/// Validate the detector-related fields of a feature configuration
pub fn validate_config(cfg: &FeatureConfig) -> FastResult<()> {
    // 0 would detect everything, >127 could cause issues with u8 arithmetic
    if cfg.threshold == 0 || cfg.threshold > 127 {
        return Err(FastError::InvalidThreshold(cfg.threshold));
    }
    if !(9..=12).contains(&cfg.fast_arc) {
        return Err(FastError::InvalidArcLength(cfg.fast_arc));
    }
    if cfg.patch_size < 3 || cfg.patch_size % 2 == 0 {
        return Err(FastError::InvalidPatchSize { patch_size: cfg.patch_size });
    }
    Ok(())
}

/// Distance from the image border inside which no keypoint is reported
pub fn detection_border(cfg: &FeatureConfig) -> usize {
    let harris_reach = HARRIS_BLOCK_SIZE / 2 + 2;
    cfg.edge_threshold.max(harris_reach)
}

/// Smallest image side that can still hold a keypoint
pub fn min_level_size(cfg: &FeatureConfig) -> usize {
    (2 * detection_border(cfg) + 1).max(MIN_IMAGE_SIZE)
}

/// FAST keypoint detector for one image size
#[derive(Debug, Clone)]
pub struct FastDetector {
    cfg: FeatureConfig,
    w: usize,
    h: usize,
}

impl FastDetector {
    /// Creates a new FAST detector with validation
    pub fn new(cfg: FeatureConfig, width: usize, height: usize) -> FastResult<Self> {
        if width == 0 || height == 0 {
            return Err(FastError::InvalidImageSize { width, height });
        }
        if width < MIN_IMAGE_SIZE || height < MIN_IMAGE_SIZE {
            return Err(FastError::ImageTooSmall {
                width,
                height,
                min_size: MIN_IMAGE_SIZE,
            });
        }
        validate_config(&cfg)?;

        Ok(Self { cfg, w: width, h: height })
    }

    pub fn border(&self) -> usize {
        detection_border(&self.cfg)
    }

    /// Validates image data before processing
    fn validate_image(&self, img: &Image) -> FastResult<()> {
        let expected_len = self.w * self.h;
        if img.len() != expected_len {
            return Err(FastError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Detect up to `max_features` oriented keypoints, strongest first.
    ///
    /// Coordinates are in this detector's image; `octave` is 0 and `size`
    /// is the patch size. Callers working on pyramid levels rescale them.
    pub fn detect_keypoints(&self, img: &Image, max_features: usize) -> FastResult<Vec<Keypoint>> {
        let mut scored = self.detect_keypoints_with_response(img)?;
        KeypointRefinement::retain_best(&mut scored, max_features);

        if self.cfg.nms_distance > 0.0 {
            scored = KeypointRefinement::non_maximum_suppression(&scored, self.cfg.nms_distance);
        }

        let keypoints = scored
            .par_iter()
            .map(|sk| {
                let mut kp = sk.keypoint;
                kp.angle = self.compute_orientation(img, kp.x, kp.y);
                kp.size = self.cfg.patch_size as f32;
                kp.response = sk.response;
                kp
            })
            .collect();

        Ok(keypoints)
    }

    /// Detect FAST corners after 3x3 non-maximum suppression, in raster order.
    ///
    /// The response is the FAST score or the Harris response depending on
    /// the configured `DetectorKind`.
    pub fn detect_keypoints_with_response(&self, img: &Image) -> FastResult<Vec<ScoredKeypoint>> {
        self.validate_image(img)?;

        let border = self.border();
        let scores = CornerDetector::score_map(
            img,
            self.w,
            self.h,
            border,
            self.cfg.threshold,
            self.cfg.fast_arc as usize,
        );
        let maxima = CornerDetector::local_maxima(&scores, self.w, self.h, border);

        let keypoints: Vec<ScoredKeypoint> = maxima
            .into_par_iter()
            .map(|(x, y, fast_score)| {
                let response = match self.cfg.detector {
                    DetectorKind::Fast => fast_score,
                    DetectorKind::Harris => self.compute_harris_response(img, x, y),
                };
                let mut keypoint = Keypoint::new(x as f32, y as f32);
                keypoint.response = response;
                ScoredKeypoint { keypoint, response }
            })
            .collect();

        tracing::trace!(
            width = self.w,
            height = self.h,
            candidates = keypoints.len(),
            "FAST candidates after 3x3 suppression"
        );

        Ok(keypoints)
    }

    /// Compute Harris corner response at a specific location
    pub fn compute_harris_response(&self, img: &Image, x: usize, y: usize) -> f32 {
        CornerDetector::compute_harris_response(img, self.w, self.h, x, y)
    }

    /// Compute orientation using intensity centroid method
    pub fn compute_orientation(&self, img: &Image, x: f32, y: f32) -> f32 {
        KeypointRefinement::compute_orientation(img, self.w, self.h, x, y, self.cfg.patch_size)
    }

    /// Get detector configuration
    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    /// Get image dimensions
    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}
