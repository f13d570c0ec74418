use crate::frame::Frame;
use crate::locator::Localization;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

pub const BOUNDARY_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const KEYPOINT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOUNDARY_THICKNESS: u32 = 4;

/// Line of `thickness` pixels built from parallel one-pixel segments
pub fn draw_thick_line_mut(canvas: &mut RgbImage, start: (f32, f32), end: (f32, f32), thickness: u32, color: Rgb<u8>) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 || !len.is_finite() {
        return;
    }
    let (nx, ny) = (-dy / len, dx / len);

    // Half-pixel steps leave no gaps on diagonals
    let steps = (thickness.max(1) * 2 - 1) as i32;
    for i in 0..steps {
        let offset = (i as f32 - (steps - 1) as f32 / 2.0) * 0.5;
        draw_line_segment_mut(
            canvas,
            (start.0 + nx * offset, start.1 + ny * offset),
            (end.0 + nx * offset, end.1 + ny * offset),
            color,
        );
    }
}

/// Color frame with keypoints as circles and, when found, the object
/// boundary as a closed green quad
pub fn annotate(frame: &Frame, localization: &Localization) -> RgbImage {
    let mut output = frame.color.clone();

    for kp in &localization.keypoints {
        let radius = ((kp.size / 10.0).round() as i32).max(3);
        draw_hollow_circle_mut(&mut output, (kp.x.round() as i32, kp.y.round() as i32), radius, KEYPOINT_COLOR);
    }

    if let Some(location) = localization.result.location() {
        let corners = location.corners;
        for i in 0..corners.len() {
            let a = corners[i];
            let b = corners[(i + 1) % corners.len()];
            draw_thick_line_mut(
                &mut output,
                (a[0] as f32, a[1] as f32),
                (b[0] as f32, b[1] as f32),
                BOUNDARY_THICKNESS,
                BOUNDARY_COLOR,
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{LocalizationResult, ObjectLocation};
    use objrec_core::Keypoint;
    use objrec_geometry::NotFoundReason;

    fn blank_frame() -> Frame {
        Frame::from_rgb(RgbImage::from_pixel(100, 80, Rgb([10, 10, 10])))
    }

    #[test]
    fn test_boundary_is_drawn() {
        let localization = Localization {
            result: LocalizationResult::Found(ObjectLocation {
                corners: [[20.0, 20.0], [80.0, 20.0], [80.0, 60.0], [20.0, 60.0]],
                center: [50.0, 40.0],
                area: 2400.0,
                inliers: 10,
                homography: [[1.0, 0.0, 20.0], [0.0, 1.0, 20.0], [0.0, 0.0, 1.0]],
            }),
            matches: Vec::new(),
            keypoints: Vec::new(),
        };
        let out = annotate(&blank_frame(), &localization);

        assert_eq!(out.get_pixel(50, 20), &BOUNDARY_COLOR);
        assert_eq!(out.get_pixel(80, 40), &BOUNDARY_COLOR);
        // Thickness spreads across the edge
        assert_eq!(out.get_pixel(50, 21), &BOUNDARY_COLOR);
        assert_eq!(out.get_pixel(50, 40), &Rgb([10, 10, 10]));
    }

    #[test]
    fn test_not_found_draws_only_keypoints() {
        let localization = Localization {
            result: LocalizationResult::NotFound(NotFoundReason::NoMatches),
            matches: Vec::new(),
            keypoints: vec![Keypoint::new(50.0, 40.0)],
        };
        let out = annotate(&blank_frame(), &localization);

        assert_eq!(out.get_pixel(53, 40), &KEYPOINT_COLOR);
        assert!(out.pixels().all(|p| *p != BOUNDARY_COLOR));
    }

    #[test]
    fn test_degenerate_line_is_skipped() {
        let mut img = RgbImage::new(10, 10);
        draw_thick_line_mut(&mut img, (5.0, 5.0), (5.0, 5.0), 4, BOUNDARY_COLOR);
        assert!(img.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
