use objrec_core::{Correspondence, Descriptor, MatchMetric};
use rayon::prelude::*;

/// Exhaustive nearest-neighbour search over binary descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceMatcher {
    metric: MatchMetric,
}

impl BruteForceMatcher {
    pub fn new(metric: MatchMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> MatchMetric {
        self.metric
    }

    /// One correspondence per query descriptor, in query order.
    ///
    /// Each query is paired with its nearest train descriptor; equal
    /// distances go to the lowest train index. Either side empty gives
    /// an empty result.
    pub fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Correspondence> {
        if query.is_empty() || train.is_empty() {
            return Vec::new();
        }

        let matches: Vec<Correspondence> = query
            .par_iter()
            .enumerate()
            .filter_map(|(query_idx, d)| {
                self.nearest(d, train).map(|(train_idx, distance)| Correspondence {
                    query_idx,
                    train_idx,
                    distance: distance as f32,
                })
            })
            .collect();

        tracing::trace!(
            query = query.len(),
            train = train.len(),
            matches = matches.len(),
            "brute-force matching done"
        );

        matches
    }

    /// Index and distance of the closest train descriptor
    pub fn nearest(&self, descriptor: &Descriptor, train: &[Descriptor]) -> Option<(usize, u32)> {
        let mut best: Option<(usize, u32)> = None;
        for (idx, candidate) in train.iter().enumerate() {
            let dist = self.metric.distance(descriptor, candidate);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((idx, dist)),
            }
            if dist == 0 {
                break;
            }
        }
        best
    }
}
