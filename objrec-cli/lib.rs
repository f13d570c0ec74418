//! Planar object localization in a frame stream.
//!
//! A [`ReferenceModel`] is built once from a calibration image. Each frame
//! that passes through the [`FrameGate`] is run through the [`ObjectLocator`]:
//! feature extraction, brute-force matching, ratio filtering and a RANSAC
//! homography that projects the reference outline into the frame.

pub mod config;
pub mod draw;
pub mod error;
pub mod extractor;
pub mod frame;
pub mod gate;
pub mod locator;
pub mod node;
pub mod reference;

pub use config::{LocatorConfig, NodeConfig};
pub use draw::annotate;
pub use error::{LocateError, LocateResult};
pub use extractor::{FeatureExtractor, FeatureSet};
pub use frame::{Frame, FrameMessage, FramePayload};
pub use gate::FrameGate;
pub use locator::{Localization, LocalizationResult, ObjectLocation, ObjectLocator};
pub use node::{period_from_hz, DirectorySource, FrameSource, Node, NodeStats, Processed};
pub use reference::ReferenceModel;

pub use objrec_core::{self, init_thread_pool, Correspondence, Descriptor, Keypoint};
pub use objrec_geometry::NotFoundReason;
