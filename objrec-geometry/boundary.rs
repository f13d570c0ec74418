use crate::homography::Homography;

/// Quad corners in winding order
pub type Quad = [[f64; 2]; 4];

/// Signed shoelace area, positive for clockwise corners in image axes (y down)
pub fn signed_area(pts: &[[f64; 2]]) -> f64 {
    let n = pts.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            a[0] * b[1] - b[0] * a[1]
        })
        .sum();
    twice / 2.0
}

/// Strictly convex: every turn has the same non-zero orientation
pub fn is_convex(quad: &Quad) -> bool {
    let mut sign = 0.0f64;
    for i in 0..4 {
        let (a, b, c) = (quad[i], quad[(i + 1) % 4], quad[(i + 2) % 4]);
        let turn = (b[0] - a[0]) * (c[1] - b[1]) - (b[1] - a[1]) * (c[0] - b[0]);
        if turn == 0.0 || !turn.is_finite() {
            return false;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
    }
    true
}

/// Outline of the reference image: (0,0), (W,0), (W,H), (0,H)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryQuadrilateral {
    corners: Quad,
}

impl BoundaryQuadrilateral {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        Self {
            corners: [[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]],
        }
    }

    pub fn corners(&self) -> &Quad {
        &self.corners
    }

    pub fn center(&self) -> [f64; 2] {
        [self.corners[2][0] / 2.0, self.corners[2][1] / 2.0]
    }

    pub fn area(&self) -> f64 {
        signed_area(&self.corners).abs()
    }

    /// Corners mapped through `h` in the same order, `None` if any corner
    /// goes to infinity
    pub fn project(&self, h: &Homography) -> Option<Quad> {
        let mut out = [[0.0; 2]; 4];
        for (dst, src) in out.iter_mut().zip(&self.corners) {
            *dst = h.project(*src)?;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Matrix3;

    #[test]
    fn test_corners_and_center() {
        let b = BoundaryQuadrilateral::from_dimensions(640, 480);
        assert_eq!(b.corners(), &[[0.0, 0.0], [640.0, 0.0], [640.0, 480.0], [0.0, 480.0]]);
        assert_eq!(b.center(), [320.0, 240.0]);
        assert_relative_eq!(b.area(), 640.0 * 480.0);
        assert!(signed_area(b.corners()) > 0.0);
    }

    #[test]
    fn test_identity_projection_returns_boundary() {
        let b = BoundaryQuadrilateral::from_dimensions(200, 100);
        let projected = b.project(&Homography::identity()).unwrap();
        for (p, q) in projected.iter().zip(b.corners()) {
            assert_relative_eq!(p[0], q[0], epsilon = 1e-9);
            assert_relative_eq!(p[1], q[1], epsilon = 1e-9);
        }
    }

    #[test]
    fn test_projection_keeps_order() {
        let b = BoundaryQuadrilateral::from_dimensions(100, 50);
        let shift = Homography::from_matrix(Matrix3::new(1.0, 0.0, 30.0, 0.0, 1.0, -10.0, 0.0, 0.0, 1.0));
        let projected = b.project(&shift).unwrap();
        assert_eq!(projected, [[30.0, -10.0], [130.0, -10.0], [130.0, 40.0], [30.0, 40.0]]);
    }

    #[test]
    fn test_projection_to_infinity() {
        let b = BoundaryQuadrilateral::from_dimensions(100, 100);
        // w = 1 - x / 100 vanishes on the right edge
        let h = Homography::from_matrix(Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, -0.01, 0.0, 1.0));
        assert_eq!(b.project(&h), None);
    }

    #[test]
    fn test_convexity() {
        let square: Quad = [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert!(is_convex(&square));

        let reversed: Quad = [square[3], square[2], square[1], square[0]];
        assert!(is_convex(&reversed));

        let bowtie: Quad = [[0.0, 0.0], [10.0, 10.0], [10.0, 0.0], [0.0, 10.0]];
        assert!(!is_convex(&bowtie));
        assert_relative_eq!(signed_area(&bowtie), 0.0);

        let dart: Quad = [[0.0, 0.0], [10.0, 0.0], [3.0, 3.0], [0.0, 10.0]];
        assert!(!is_convex(&dart));

        let flat: Quad = [[0.0, 0.0], [5.0, 0.0], [10.0, 0.0], [0.0, 10.0]];
        assert!(!is_convex(&flat));
    }
}
