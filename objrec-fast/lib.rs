//! FAST keypoint detection for object localization.
//!
//! Segment test on a 16-pixel circle, 3x3 score suppression, optional
//! Harris ranking, intensity-centroid orientation and an image pyramid
//! for multi-scale detection.

pub mod corner_detection;
pub mod detector;
pub mod error;
pub mod pyramid;
pub mod refinement;
pub mod types;
pub mod utils;

pub use corner_detection::CornerDetector;
pub use detector::{detection_border, min_level_size, validate_config, FastDetector, MIN_IMAGE_SIZE};
pub use error::{FastError, FastResult};
pub use pyramid::ImagePyramid;
pub use refinement::KeypointRefinement;
pub use types::{ScaleLevel, ScoredKeypoint};
