//! Plane-to-plane homography and its Direct Linear Transform estimate.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

/// Projective weights below this are treated as points at infinity
const MIN_PROJECTIVE_WEIGHT: f64 = 1e-12;

/// Singularity bound on |det| over the column lengths (Hadamard ratio)
const MIN_RELATIVE_DETERMINANT: f64 = 1e-12;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum HomographyError {
    TooFewPoints { needed: usize, got: usize },
    LengthMismatch { src: usize, dst: usize },
    /// Every minimal sample was collinear or produced a singular model
    Degenerate,
    NumericalFailure(String),
    InsufficientInliers { needed: usize, found: usize },
}

impl std::fmt::Display for HomographyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { needed, got } => {
                write!(f, "too few points: need {}, got {}", needed, got)
            }
            Self::LengthMismatch { src, dst } => {
                write!(f, "point count mismatch: {} source vs {} destination", src, dst)
            }
            Self::Degenerate => write!(f, "no non-degenerate point sample"),
            Self::NumericalFailure(msg) => write!(f, "numerical failure: {}", msg),
            Self::InsufficientInliers { needed, found } => {
                write!(f, "insufficient inliers: need {}, found {}", needed, found)
            }
        }
    }
}

impl std::error::Error for HomographyError {}

pub type HomographyResult<T> = Result<T, HomographyError>;

// ── Homography ───────────────────────────────────────────────────────────

/// 3x3 projective map from reference pixels to frame pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self(m)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Row-major copy of the matrix
    pub fn to_rows(&self) -> [[f64; 3]; 3] {
        let m = &self.0;
        [
            [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
            [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
            [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
        ]
    }

    /// H * [x, y, 1]^T dehomogenized, `None` for points sent to infinity
    pub fn project(&self, p: [f64; 2]) -> Option<[f64; 2]> {
        let q = self.0 * Vector3::new(p[0], p[1], 1.0);
        if !q[2].is_finite() || q[2].abs() < MIN_PROJECTIVE_WEIGHT {
            return None;
        }
        let out = [q[0] / q[2], q[1] / q[2]];
        (out[0].is_finite() && out[1].is_finite()).then_some(out)
    }

    /// ||project(src) - dst||, infinite when `src` has no image
    pub fn reprojection_error(&self, src: &[f64; 2], dst: &[f64; 2]) -> f64 {
        match self.project(*src) {
            Some(p) => ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt(),
            None => f64::INFINITY,
        }
    }

    /// Finite entries and a non-vanishing determinant.
    ///
    /// The determinant is taken relative to the product of the column
    /// lengths, which is at most 1 and does not depend on the scale of
    /// each column.
    pub fn is_valid(&self) -> bool {
        if !self.0.iter().all(|v| v.is_finite()) {
            return false;
        }
        let columns: f64 = self.0.column_iter().map(|c| c.norm()).product();
        columns > 0.0 && (self.0.determinant() / columns).abs() > MIN_RELATIVE_DETERMINANT
    }
}

// ── Sample checks ────────────────────────────────────────────────────────

fn cross(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// True when some three of the points are (nearly) collinear or coincide
pub fn has_collinear_triple(pts: &[[f64; 2]]) -> bool {
    let n = pts.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (pts[i], pts[j], pts[k]);
                let ab = ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt();
                let ac = ((c[0] - a[0]).powi(2) + (c[1] - a[1]).powi(2)).sqrt();
                let scale = ab * ac;
                // |sin| of the angle at `a`
                if scale < 1e-12 || cross(a, b, c).abs() <= 1e-3 * scale {
                    return true;
                }
            }
        }
    }
    false
}

/// A homography of a convex region keeps the orientation of every triple
/// of a 4-point sample, or flips all of them
pub fn orientation_consistent(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (1, 2, 3), (0, 1, 3), (0, 2, 3)];
    let flipped = TRIPLES
        .iter()
        .filter(|&&(i, j, k)| cross(src[i], src[j], src[k]) * cross(dst[i], dst[j], dst[k]) < 0.0)
        .count();
    flipped == 0 || flipped == TRIPLES.len()
}

// ── Hartley normalization ────────────────────────────────────────────────

/// Translate the centroid to the origin and scale the mean distance to sqrt(2)
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    let normalized = pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();

    (t, normalized)
}

// ── DLT ──────────────────────────────────────────────────────────────────

/// Homography with `dst ≈ H(src)` from at least 4 correspondences
pub fn estimate_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> HomographyResult<Homography> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch { src: src.len(), dst: dst.len() });
    }
    if src.len() < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: src.len() });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    // Accumulate A^T A row by row instead of building the 2n x 9 system
    let mut ata = SMatrix::<f64, 9, 9>::zeros();
    for (s, d) in src_n.iter().zip(&dst_n) {
        let (sx, sy) = (s[0], s[1]);
        let (dx, dy) = (d[0], d[1]);

        let r1 = SVector::<f64, 9>::from_row_slice(&[0.0, 0.0, 0.0, -sx, -sy, -1.0, dy * sx, dy * sy, dy]);
        let r2 = SVector::<f64, 9>::from_row_slice(&[sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy, -dx]);
        ata += r1 * r1.transpose();
        ata += r2 * r2.transpose();
    }

    // The solution is the eigenvector of the smallest eigenvalue
    let eig = nalgebra::SymmetricEigen::new(ata);
    let min_idx = eig
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    // Unit-norm solution in normalized coordinates, so det is already relative
    if !(h_norm.determinant().abs() > MIN_RELATIVE_DETERMINANT) {
        return Err(HomographyError::NumericalFailure("singular homography".into()));
    }

    // H = T_dst^-1 * H_norm * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| HomographyError::NumericalFailure("T_dst not invertible".into()))?;
    let m = t_dst_inv * h_norm * t_src;

    let scale = m[(2, 2)];
    let m = if scale.abs() < 1e-15 { m } else { m / scale };
    Ok(Homography(m))
}
