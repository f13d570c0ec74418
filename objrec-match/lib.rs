//! Descriptor correspondence search and match filtering.
//!
//! [`BruteForceMatcher`] pairs every reference descriptor with its nearest
//! frame descriptor; [`MatchFilter`] keeps the matches that are close to the
//! best one.

pub mod filter;
pub mod matcher;

pub use filter::{MatchFilter, DEFAULT_RATIO};
pub use matcher::BruteForceMatcher;

use objrec_core::MatchMetric;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Matching stage settings
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatchConfig {
    pub metric: MatchMetric,
    /// Keep matches closer than `ratio` times the best distance
    pub ratio: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: MatchMetric::Hamming,
            ratio: DEFAULT_RATIO,
        }
    }
}

impl MatchConfig {
    pub fn matcher(&self) -> BruteForceMatcher {
        BruteForceMatcher::new(self.metric)
    }

    pub fn filter(&self) -> MatchFilter {
        MatchFilter::new(self.ratio)
    }
}
