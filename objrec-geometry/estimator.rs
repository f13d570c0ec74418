use crate::boundary::{is_convex, signed_area, BoundaryQuadrilateral, Quad};
use crate::homography::{Homography, HomographyError};
use crate::ransac::{fit_ransac, RansacConfig, SAMPLE_SIZE};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Why a frame produced no location
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum NotFoundReason {
    /// The frame has no keypoints
    NoKeypoints,
    /// No correspondence between reference and frame
    NoMatches,
    /// Fewer good matches than a homography needs
    TooFewMatches { found: usize },
    /// No non-degenerate sample or model
    Degenerate,
    InsufficientInliers { found: usize },
    /// Boundary went to infinity, folded or collapsed
    InvalidProjection,
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoKeypoints => write!(f, "no keypoints in frame"),
            Self::NoMatches => write!(f, "no descriptor matches"),
            Self::TooFewMatches { found } => {
                write!(f, "too few good matches: need {}, found {}", SAMPLE_SIZE, found)
            }
            Self::Degenerate => write!(f, "degenerate correspondences"),
            Self::InsufficientInliers { found } => write!(f, "insufficient inliers: {}", found),
            Self::InvalidProjection => write!(f, "invalid boundary projection"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeometryConfig {
    /// Reject projected boundaries that are not strictly convex
    pub require_convex: bool,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self { require_convex: true }
    }
}

/// Successful fit with the projected reference boundary
#[derive(Debug, Clone)]
pub struct HomographyFit {
    pub homography: Homography,
    pub corners: Quad,
    /// Reference image center mapped into the frame
    pub center: [f64; 2],
    pub area: f64,
    pub inliers: usize,
    pub inlier_mask: Vec<bool>,
}

#[derive(Debug, Clone)]
pub enum Estimation {
    Found(HomographyFit),
    NotFound(NotFoundReason),
}

impl Estimation {
    pub fn is_found(&self) -> bool {
        matches!(self, Estimation::Found(_))
    }
}

/// Robust reference-to-frame homography plus boundary projection
#[derive(Debug, Clone)]
pub struct GeometryEstimator {
    boundary: BoundaryQuadrilateral,
    ransac: RansacConfig,
    config: GeometryConfig,
}

impl GeometryEstimator {
    pub fn new(boundary: BoundaryQuadrilateral, ransac: RansacConfig, config: GeometryConfig) -> Self {
        Self { boundary, ransac, config }
    }

    pub fn boundary(&self) -> &BoundaryQuadrilateral {
        &self.boundary
    }

    /// Fit `frame ≈ H(reference)` and project the boundary.
    ///
    /// Every failure is reported as `NotFound`.
    pub fn estimate(&self, reference: &[[f64; 2]], frame: &[[f64; 2]]) -> Estimation {
        let found = reference.len().min(frame.len());
        if found < SAMPLE_SIZE || reference.len() != frame.len() {
            return Estimation::NotFound(NotFoundReason::TooFewMatches { found });
        }

        let fit = match fit_ransac(reference, frame, &self.ransac) {
            Ok(fit) => fit,
            Err(HomographyError::InsufficientInliers { found, .. }) => {
                return Estimation::NotFound(NotFoundReason::InsufficientInliers { found });
            }
            Err(HomographyError::TooFewPoints { got, .. }) => {
                return Estimation::NotFound(NotFoundReason::TooFewMatches { found: got });
            }
            Err(err) => {
                tracing::debug!(%err, "homography fit failed");
                return Estimation::NotFound(NotFoundReason::Degenerate);
            }
        };

        let Some(corners) = self.boundary.project(&fit.homography) else {
            return Estimation::NotFound(NotFoundReason::InvalidProjection);
        };
        let Some(center) = fit.homography.project(self.boundary.center()) else {
            return Estimation::NotFound(NotFoundReason::InvalidProjection);
        };

        let area = signed_area(&corners).abs();
        if !(area > 0.0) || (self.config.require_convex && !is_convex(&corners)) {
            tracing::debug!(?corners, area, "projected boundary rejected");
            return Estimation::NotFound(NotFoundReason::InvalidProjection);
        }

        Estimation::Found(HomographyFit {
            homography: fit.homography,
            corners,
            center,
            area,
            inliers: fit.n_inliers,
            inlier_mask: fit.inlier_mask,
        })
    }
}
