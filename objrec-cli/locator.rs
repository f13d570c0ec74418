use crate::config::LocatorConfig;
use crate::error::LocateResult;
use crate::extractor::{FeatureExtractor, FeatureSet};
use crate::frame::Frame;
use crate::reference::ReferenceModel;
use image::GrayImage;
use objrec_core::{Correspondence, Keypoint};
use objrec_geometry::{Estimation, GeometryEstimator, HomographyFit, NotFoundReason, Quad};
use objrec_match::{BruteForceMatcher, MatchFilter};
use serde::Serialize;
use std::path::Path;

/// Where the reference object sits in a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectLocation {
    /// Reference corners (0,0), (W,0), (W,H), (0,H) projected into the frame
    pub corners: Quad,
    /// Projected reference center
    pub center: [f64; 2],
    pub area: f64,
    pub inliers: usize,
    /// Row-major reference-to-frame homography
    pub homography: [[f64; 3]; 3],
}

impl From<&HomographyFit> for ObjectLocation {
    fn from(fit: &HomographyFit) -> Self {
        Self {
            corners: fit.corners,
            center: fit.center,
            area: fit.area,
            inliers: fit.inliers,
            homography: fit.homography.to_rows(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalizationResult {
    Found(ObjectLocation),
    NotFound(NotFoundReason),
}

impl LocalizationResult {
    pub fn location(&self) -> Option<&ObjectLocation> {
        match self {
            LocalizationResult::Found(location) => Some(location),
            LocalizationResult::NotFound(_) => None,
        }
    }
}

/// Pipeline output for one frame
#[derive(Debug, Clone)]
pub struct Localization {
    pub result: LocalizationResult,
    /// Good matches that reached the geometry stage
    pub matches: Vec<Correspondence>,
    /// Frame keypoints, `train_idx` of `matches` indexes into these
    pub keypoints: Vec<Keypoint>,
}

impl Localization {
    fn not_found(reason: NotFoundReason, matches: Vec<Correspondence>, features: FeatureSet) -> Self {
        Self {
            result: LocalizationResult::NotFound(reason),
            matches,
            keypoints: features.keypoints,
        }
    }
}

/// Extract, match, filter and fit against a fixed reference
#[derive(Debug, Clone)]
pub struct ObjectLocator {
    extractor: FeatureExtractor,
    reference: ReferenceModel,
    matcher: BruteForceMatcher,
    filter: MatchFilter,
    estimator: GeometryEstimator,
}

impl ObjectLocator {
    /// `extractor` must be the one the reference was built with
    pub fn new(extractor: FeatureExtractor, reference: ReferenceModel, config: &LocatorConfig) -> Self {
        let estimator = GeometryEstimator::new(reference.boundary(), config.ransac.clone(), config.geometry);
        Self {
            extractor,
            reference,
            matcher: config.matching.matcher(),
            filter: config.matching.filter(),
            estimator,
        }
    }

    /// Build the reference model from a calibration image on disk
    pub fn open<P: AsRef<Path>>(calibration: P, config: &LocatorConfig) -> LocateResult<Self> {
        let extractor = FeatureExtractor::new(config.features.clone())?;
        let reference = ReferenceModel::open(calibration, &extractor)?;
        Ok(Self::new(extractor, reference, config))
    }

    pub fn reference(&self) -> &ReferenceModel {
        &self.reference
    }

    pub fn locate_frame(&self, frame: &Frame) -> LocateResult<Localization> {
        self.locate(&frame.gray)
    }

    /// Run the full pipeline on one grayscale frame.
    ///
    /// Empty intermediate results are reported as `NotFound`, never as errors.
    pub fn locate(&self, gray: &GrayImage) -> LocateResult<Localization> {
        let features = self.extractor.extract(gray)?;
        if features.is_empty() {
            return Ok(Localization::not_found(NotFoundReason::NoKeypoints, Vec::new(), features));
        }

        let reference = self.reference.features();
        let matches = self.matcher.match_descriptors(&reference.descriptors, &features.descriptors);
        if matches.is_empty() {
            return Ok(Localization::not_found(NotFoundReason::NoMatches, matches, features));
        }

        let good = self.filter.filter(&matches);
        tracing::debug!(
            keypoints = features.len(),
            matches = matches.len(),
            good = good.len(),
            "frame matched against reference"
        );

        let reference_pts: Vec<[f64; 2]> = good.iter().map(|m| reference.keypoints[m.query_idx].position()).collect();
        let frame_pts: Vec<[f64; 2]> = good.iter().map(|m| features.keypoints[m.train_idx].position()).collect();

        let result = match self.estimator.estimate(&reference_pts, &frame_pts) {
            Estimation::Found(fit) => LocalizationResult::Found(ObjectLocation::from(&fit)),
            Estimation::NotFound(reason) => LocalizationResult::NotFound(reason),
        };

        Ok(Localization {
            result,
            matches: good,
            keypoints: features.keypoints,
        })
    }
}
