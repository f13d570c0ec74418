//! Reference-to-frame geometry: robust homography fitting and projection of
//! the reference outline into the frame.

pub mod boundary;
pub mod estimator;
pub mod homography;
pub mod ransac;

pub use boundary::{is_convex, signed_area, BoundaryQuadrilateral, Quad};
pub use estimator::{Estimation, GeometryConfig, GeometryEstimator, HomographyFit, NotFoundReason};
pub use homography::{estimate_dlt, Homography, HomographyError, HomographyResult};
pub use ransac::{adaptive_iterations, fit_ransac, RansacConfig, RansacResult, SAMPLE_SIZE};
