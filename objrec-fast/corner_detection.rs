use objrec_core::Image;
use crate::types::CornerType;
use crate::utils::has_contiguous_arc;
use rayon::prelude::*;

/// Window used for the Harris structure tensor
pub const HARRIS_BLOCK_SIZE: usize = 7;

/// Corner detection algorithms (FAST and Harris)
pub struct CornerDetector;

impl CornerDetector {
    /// FAST circle offsets (radius 3 Bresenham circle, clockwise from the top)
    pub const FAST_OFFSETS: [(i32, i32); 16] = [
        (0, -3), (1, -3), (2, -2), (3, -1),
        (3, 0), (3, 1), (2, 2), (1, 3),
        (0, 3), (-1, 3), (-2, 2), (-3, 1),
        (-3, 0), (-3, -1), (-2, -2), (-1, -3),
    ];

    /// Segment test at (x, y). The pixel must be at least 3 pixels from every border.
    ///
    /// Returns the corner type and its score: the summed excess contrast
    /// (|q - p| - threshold) of the circle pixels in the winning arc class.
    pub(crate) fn segment_test(
        img: &Image,
        width: usize,
        x: usize,
        y: usize,
        threshold: u8,
        arc: usize,
    ) -> (CornerType, f32) {
        let center = img[y * width + x] as i32;
        let t = threshold as i32;

        let mut bright = 0u16;
        let mut dark = 0u16;
        let mut diffs = [0i32; 16];

        for (i, &(dx, dy)) in Self::FAST_OFFSETS.iter().enumerate() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let d = img[py * width + px] as i32 - center;
            diffs[i] = d;
            if d > t {
                bright |= 1 << i;
            } else if d < -t {
                dark |= 1 << i;
            }
        }

        let (kind, mask) = if has_contiguous_arc(bright, arc) {
            (CornerType::Bright, bright)
        } else if has_contiguous_arc(dark, arc) {
            (CornerType::Dark, dark)
        } else {
            return (CornerType::None, 0.0);
        };

        let score: i32 = diffs
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, d)| d.abs() - t)
            .sum();

        (kind, score as f32)
    }

    /// FAST score for every pixel inside `border`, 0 where the segment test fails
    pub fn score_map(
        img: &Image,
        width: usize,
        height: usize,
        border: usize,
        threshold: u8,
        arc: usize,
    ) -> Vec<f32> {
        let mut scores = vec![0.0f32; width * height];
        if width <= 2 * border || height <= 2 * border {
            return scores;
        }

        scores
            .par_chunks_mut(width)
            .enumerate()
            .filter(|(y, _)| *y >= border && *y < height - border)
            .for_each(|(y, row)| {
                for (x, score) in row.iter_mut().enumerate().take(width - border).skip(border) {
                    let (kind, s) = Self::segment_test(img, width, x, y, threshold, arc);
                    if kind != CornerType::None {
                        *score = s;
                    }
                }
            });

        scores
    }

    /// 3x3 non-maximum suppression over a score map.
    ///
    /// Equal neighbours are resolved in raster order, the first one wins.
    /// Output is in raster order.
    pub fn local_maxima(scores: &[f32], width: usize, height: usize, border: usize) -> Vec<(usize, usize, f32)> {
        let border = border.max(1);
        if width <= 2 * border || height <= 2 * border {
            return Vec::new();
        }

        let rows: Vec<Vec<(usize, usize, f32)>> = (border..height - border)
            .into_par_iter()
            .map(|y| {
                let mut found = Vec::new();
                for x in border..width - border {
                    let s = scores[y * width + x];
                    if s <= 0.0 {
                        continue;
                    }
                    let mut is_max = true;
                    'window: for ny in y - 1..=y + 1 {
                        for nx in x - 1..=x + 1 {
                            if nx == x && ny == y {
                                continue;
                            }
                            let n = scores[ny * width + nx];
                            let earlier = (ny, nx) < (y, x);
                            if n > s || (earlier && n == s) {
                                is_max = false;
                                break 'window;
                            }
                        }
                    }
                    if is_max {
                        found.push((x, y, s));
                    }
                }
                found
            })
            .collect();

        rows.into_iter().flatten().collect()
    }

    /// Harris corner response `det(M) - k * trace(M)^2` over a
    /// `HARRIS_BLOCK_SIZE` window of Sobel gradients.
    ///
    /// The window plus the Sobel footprint must lie inside the image,
    /// otherwise 0 is returned.
    pub fn compute_harris_response(img: &Image, width: usize, height: usize, x: usize, y: usize) -> f32 {
        let r = HARRIS_BLOCK_SIZE / 2;
        if x < r + 1 || y < r + 1 || x + r + 1 >= width || y + r + 1 >= height {
            return 0.0;
        }

        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for ny in y - r..=y + r {
            for nx in x - r..=x + r {
                let (gx, gy) = Self::sobel(img, width, nx, ny);
                ixx += gx * gx;
                ixy += gx * gy;
                iyy += gy * gy;
            }
        }

        // Keep the response in a comparable range across images
        let norm = 1.0 / (4.0 * HARRIS_BLOCK_SIZE as f64 * 255.0);
        let (ixx, ixy, iyy) = (ixx * norm * norm, ixy * norm * norm, iyy * norm * norm);

        let k = 0.04f64;
        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        (det - k * trace * trace) as f32
    }

    fn sobel(img: &Image, width: usize, x: usize, y: usize) -> (f64, f64) {
        let at = |xx: usize, yy: usize| img[yy * width + xx] as f64;

        let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x - 1, y) - at(x - 1, y + 1);
        let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
            - at(x - 1, y - 1) - 2.0 * at(x, y - 1) - at(x + 1, y - 1);

        (gx, gy)
    }
}
