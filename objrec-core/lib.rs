#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Row-major 8-bit grayscale image
pub type Image = Vec<u8>;

/// Key-point ≙ FAST corner + orientation (radians), in base-image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    /// Diameter of the described patch, in base-image pixels
    pub size: f32,
    pub response: f32,
    /// Pyramid level the keypoint was detected on
    pub octave: u8,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            angle: 0.0,
            size: 0.0,
            response: 0.0,
            octave: 0,
        }
    }

    pub fn position(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// Number of differing bits
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Number of differing 2-bit cells
pub fn hamming2_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x ^ y;
            ((d | (d >> 1)) & 0x55).count_ones()
        })
        .sum()
}

/// Proposed pairing between a reference keypoint (query) and a frame keypoint (train)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Correspondence {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

/// Keypoint ranking strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DetectorKind {
    /// Rank by FAST segment score
    Fast,
    /// Rank FAST candidates by Harris corner response
    #[default]
    Harris,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DescriptorKind {
    /// Pattern sampled in image axes
    Brief,
    /// Pattern rotated by the keypoint orientation
    #[default]
    OrientedBrief,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MatchMetric {
    #[default]
    Hamming,
    Hamming2,
}

impl MatchMetric {
    pub fn distance(self, a: &Descriptor, b: &Descriptor) -> u32 {
        match self {
            MatchMetric::Hamming => hamming_distance(a, b),
            MatchMetric::Hamming2 => hamming2_distance(a, b),
        }
    }
}

/// Feature extraction settings shared by the detector and descriptor crates
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeatureConfig {
    pub detector: DetectorKind,
    pub descriptor: DescriptorKind,
    /// FAST intensity threshold (1-127)
    pub threshold: u8,
    /// Contiguous arc length for the FAST segment test (9-12)
    pub fast_arc: u8,
    /// Orientation / descriptor patch diameter (odd)
    pub patch_size: usize,
    /// Keypoints closer than this to a level border are dropped
    pub edge_threshold: usize,
    pub max_features: usize,
    pub n_levels: usize,
    pub scale_factor: f32,
    /// Minimum distance between kept keypoints, 0 disables
    pub nms_distance: f32,
    /// Gaussian smoothing before descriptor sampling, 0 disables
    pub blur_sigma: f32,
    /// Seed of the BRIEF sampling pattern
    pub pattern_seed: u64,
    pub n_threads: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            detector: DetectorKind::Harris,
            descriptor: DescriptorKind::OrientedBrief,
            threshold: 20,
            fast_arc: 9,
            patch_size: 31,
            edge_threshold: 31,
            max_features: 500,
            n_levels: 4,
            scale_factor: 1.2,
            nms_distance: 0.0,
            blur_sigma: 2.0,
            pattern_seed: 0x0b5e_c7ed,
            n_threads: num_cpus::get().max(1),
        }
    }
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
