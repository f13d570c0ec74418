use crate::error::LocateResult;
use crate::extractor::{FeatureExtractor, FeatureSet};
use image::{GrayImage, ImageReader};
use objrec_geometry::BoundaryQuadrilateral;
use std::path::Path;

/// Features of the calibration image, computed once at startup
#[derive(Debug, Clone)]
pub struct ReferenceModel {
    width: u32,
    height: u32,
    features: FeatureSet,
}

impl ReferenceModel {
    pub fn from_image(gray: &GrayImage, extractor: &FeatureExtractor) -> LocateResult<Self> {
        let features = extractor.extract(gray)?;
        let (width, height) = gray.dimensions();

        if features.is_empty() {
            tracing::warn!(width, height, "calibration image has no features, frames will never match");
        } else {
            tracing::info!(width, height, keypoints = features.len(), "reference model built");
        }

        Ok(Self { width, height, features })
    }

    /// Read, decode and convert the calibration image to grayscale
    pub fn open<P: AsRef<Path>>(path: P, extractor: &FeatureExtractor) -> LocateResult<Self> {
        let gray = ImageReader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?
            .to_luma8();
        Self::from_image(&gray, extractor)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn boundary(&self) -> BoundaryQuadrilateral {
        BoundaryQuadrilateral::from_dimensions(self.width, self.height)
    }
}
