use crate::homography::{
    estimate_dlt, has_collinear_triple, orientation_consistent, Homography, HomographyError,
    HomographyResult,
};
use rand::{rngs::StdRng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Points in a minimal homography sample
pub const SAMPLE_SIZE: usize = 4;

/// RANSAC configuration for homography fitting
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RansacConfig {
    /// Upper bound on sampled hypotheses
    pub max_iters: usize,
    /// Inlier threshold on the reprojection error, in frame pixels
    pub reprojection_threshold: f64,
    /// Probability of drawing at least one all-inlier sample
    pub confidence: f64,
    /// Smallest inlier count accepted as a location, never below `SAMPLE_SIZE`
    pub min_inliers: usize,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            reprojection_threshold: 3.0,
            confidence: 0.995,
            min_inliers: SAMPLE_SIZE,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RansacResult {
    pub homography: Homography,
    /// True for correspondences within the threshold of the final model
    pub inlier_mask: Vec<bool>,
    pub n_inliers: usize,
    /// Hypotheses drawn, degenerate ones included
    pub iterations: usize,
}

/// Iterations needed to draw one all-inlier sample with `confidence`,
/// given the current inlier ratio
pub fn adaptive_iterations(confidence: f64, inlier_ratio: f64, max_iters: usize) -> usize {
    if inlier_ratio >= 1.0 {
        return 1;
    }
    let good_sample = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if good_sample <= f64::EPSILON {
        return max_iters;
    }
    let needed = (1.0 - confidence).ln() / (1.0 - good_sample).ln();
    if !needed.is_finite() || needed < 0.0 {
        return max_iters;
    }
    (needed.ceil() as usize).clamp(1, max_iters)
}

fn count_inliers(h: &Homography, src: &[[f64; 2]], dst: &[[f64; 2]], threshold: f64) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error(s, d) <= threshold)
        .collect();
    let count = mask.iter().filter(|&&m| m).count();
    (mask, count)
}

/// Fit a homography `dst ≈ H(src)` robust to outlier correspondences.
///
/// Samples whose points are collinear or that fold the plane are skipped,
/// as are singular models. The best hypothesis is refit on its inliers.
pub fn fit_ransac(src: &[[f64; 2]], dst: &[[f64; 2]], config: &RansacConfig) -> HomographyResult<RansacResult> {
    let n = src.len();
    if n != dst.len() {
        return Err(HomographyError::LengthMismatch { src: n, dst: dst.len() });
    }
    if n < SAMPLE_SIZE {
        return Err(HomographyError::TooFewPoints { needed: SAMPLE_SIZE, got: n });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut best: Option<(Homography, usize)> = None;
    let mut needed = config.max_iters.max(1);
    let mut iterations = 0;

    while iterations < needed {
        iterations += 1;

        let idx = rand::seq::index::sample(&mut rng, n, SAMPLE_SIZE);
        let mut s4 = [[0.0; 2]; SAMPLE_SIZE];
        let mut d4 = [[0.0; 2]; SAMPLE_SIZE];
        for (k, i) in idx.iter().enumerate() {
            s4[k] = src[i];
            d4[k] = dst[i];
        }

        if has_collinear_triple(&s4) || has_collinear_triple(&d4) || !orientation_consistent(&s4, &d4) {
            continue;
        }

        let h = match estimate_dlt(&s4, &d4) {
            Ok(h) if h.is_valid() => h,
            _ => continue,
        };

        let (_, count) = count_inliers(&h, src, dst, config.reprojection_threshold);
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((h, count));
            let ratio = count as f64 / n as f64;
            needed = adaptive_iterations(config.confidence, ratio, config.max_iters.max(1));
        }
    }

    let Some((best_h, best_count)) = best else {
        return Err(HomographyError::Degenerate);
    };

    let min_inliers = config.min_inliers.max(SAMPLE_SIZE);
    if best_count < min_inliers {
        return Err(HomographyError::InsufficientInliers { needed: min_inliers, found: best_count });
    }

    let (best_mask, _) = count_inliers(&best_h, src, dst, config.reprojection_threshold);
    let inlier_src: Vec<[f64; 2]> = src.iter().zip(&best_mask).filter(|(_, &m)| m).map(|(p, _)| *p).collect();
    let inlier_dst: Vec<[f64; 2]> = dst.iter().zip(&best_mask).filter(|(_, &m)| m).map(|(p, _)| *p).collect();

    // Keep the refit only if it explains at least as many points
    let homography = match estimate_dlt(&inlier_src, &inlier_dst) {
        Ok(refit) if refit.is_valid() => {
            let (_, refit_count) = count_inliers(&refit, src, dst, config.reprojection_threshold);
            if refit_count >= best_count {
                refit
            } else {
                best_h
            }
        }
        _ => best_h,
    };

    let (inlier_mask, n_inliers) = count_inliers(&homography, src, dst, config.reprojection_threshold);

    tracing::trace!(iterations, n_inliers, total = n, "RANSAC homography fitted");

    Ok(RansacResult {
        homography,
        inlier_mask,
        n_inliers,
        iterations,
    })
}
