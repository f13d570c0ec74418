use objrec_core::Correspondence;

/// Matches closer than `ratio` times the best distance are kept
pub const DEFAULT_RATIO: f32 = 3.0;

/// Distance-ratio filter relative to the best match of a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchFilter {
    ratio: f32,
}

impl Default for MatchFilter {
    fn default() -> Self {
        Self::new(DEFAULT_RATIO)
    }
}

impl MatchFilter {
    pub fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    pub fn ratio(&self) -> f32 {
        self.ratio
    }

    pub fn min_distance(matches: &[Correspondence]) -> Option<f32> {
        matches.iter().map(|m| m.distance).min_by(|a, b| a.total_cmp(b))
    }

    /// Keep matches with `distance < ratio * min_distance`, plus every match
    /// at exactly `min_distance`. Input order is preserved.
    ///
    /// With a zero minimum only the exact matches survive.
    pub fn filter(&self, matches: &[Correspondence]) -> Vec<Correspondence> {
        let Some(min_dist) = Self::min_distance(matches) else {
            return Vec::new();
        };
        let threshold = self.ratio * min_dist;

        let good: Vec<Correspondence> = matches
            .iter()
            .filter(|m| m.distance < threshold || m.distance == min_dist)
            .copied()
            .collect();

        tracing::trace!(
            total = matches.len(),
            good = good.len(),
            min_dist,
            threshold,
            "ratio filter applied"
        );

        good
    }
}
