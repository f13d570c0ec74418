use objrec_core::Image;
use crate::types::ScoredKeypoint;

/// Keypoint selection and orientation
pub struct KeypointRefinement;

impl KeypointRefinement {
    /// Keep the `max_count` strongest keypoints. Ties keep their input order.
    pub fn retain_best(keypoints: &mut Vec<ScoredKeypoint>, max_count: usize) {
        if keypoints.len() <= max_count {
            return;
        }
        keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));
        keypoints.truncate(max_count);
    }

    /// Greedy radius suppression, strongest first
    pub fn non_maximum_suppression(keypoints: &[ScoredKeypoint], min_distance: f32) -> Vec<ScoredKeypoint> {
        if keypoints.is_empty() {
            return Vec::new();
        }

        let mut sorted_keypoints = keypoints.to_vec();
        sorted_keypoints.sort_by(|a, b| b.response.total_cmp(&a.response));

        let mut suppressed: Vec<ScoredKeypoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in sorted_keypoints {
            let is_local_max = suppressed.iter().all(|existing| {
                let dx = candidate.keypoint.x - existing.keypoint.x;
                let dy = candidate.keypoint.y - existing.keypoint.y;
                dx * dx + dy * dy >= min_distance_sq
            });

            if is_local_max {
                suppressed.push(candidate);
            }
        }

        suppressed
    }

    /// Orientation by the intensity centroid of a circular patch of diameter `patch_size`.
    ///
    /// Pixels outside the image are clamped to the nearest edge.
    pub fn compute_orientation(img: &Image, width: usize, height: usize, x: f32, y: f32, patch_size: usize) -> f32 {
        let half = (patch_size / 2) as i32;
        let (cx, cy) = (x.round() as i32, y.round() as i32);
        let radius_sq = half * half;

        let mut m10 = 0i64;
        let mut m01 = 0i64;

        for dy in -half..=half {
            let yy = (cy + dy).clamp(0, height as i32 - 1) as usize;
            for dx in -half..=half {
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }
                let xx = (cx + dx).clamp(0, width as i32 - 1) as usize;
                let val = img[yy * width + xx] as i64;
                m10 += dx as i64 * val;
                m01 += dy as i64 * val;
            }
        }

        if m10 == 0 && m01 == 0 {
            0.0
        } else {
            (m01 as f32).atan2(m10 as f32)
        }
    }
}
