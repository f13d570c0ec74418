mod common;

use approx::assert_abs_diff_eq;
use common::{encode_png, paste, pyramid_config, single_level_config, textured_reference, to_bgr8, to_rgb};
use image::GrayImage;
use objrec_cli::{
    FeatureExtractor, Frame, FrameMessage, LocalizationResult, LocatorConfig, Node, NotFoundReason, ObjectLocator,
    ReferenceModel,
};
use std::time::Duration;

const REF_W: u32 = 240;
const REF_H: u32 = 180;

fn locator_for(reference: &GrayImage, config: &LocatorConfig) -> ObjectLocator {
    let extractor = FeatureExtractor::new(config.features.clone()).unwrap();
    let model = ReferenceModel::from_image(reference, &extractor).unwrap();
    assert!(model.features().len() >= 50, "reference too plain: {}", model.features().len());
    ObjectLocator::new(extractor, model, config)
}

fn assert_corners(found: &[[f64; 2]; 4], expected: &[[f64; 2]; 4], tol: f64) {
    for (c, e) in found.iter().zip(expected) {
        assert_abs_diff_eq!(c[0], e[0], epsilon = tol);
        assert_abs_diff_eq!(c[1], e[1], epsilon = tol);
    }
}

#[test]
fn test_reference_matches_itself() {
    let reference = textured_reference(REF_W, REF_H, 1);
    let mut config = LocatorConfig::default();
    config.features.n_threads = 1;
    let locator = locator_for(&reference, &config);

    let localization = locator.locate(&reference).unwrap();
    let location = localization
        .result
        .location()
        .unwrap_or_else(|| panic!("expected a match, got {:?}", localization.result));

    let (w, h) = (REF_W as f64, REF_H as f64);
    assert_corners(&location.corners, &[[0.0, 0.0], [w, 0.0], [w, h], [0.0, h]], 1.0);
    assert_abs_diff_eq!(location.center[0], w / 2.0, epsilon = 1.0);
    assert_abs_diff_eq!(location.center[1], h / 2.0, epsilon = 1.0);
    assert!(location.inliers >= 8);
    assert!(localization.matches.iter().all(|m| m.train_idx < localization.keypoints.len()));
}

#[test]
fn test_translated_object_is_located() {
    let reference = textured_reference(REF_W, REF_H, 7);
    let locator = locator_for(&reference, &single_level_config());

    let (dx, dy) = (70.0, 45.0);
    let frame = paste(&reference, 400, 300, 70, 45);
    let localization = locator.locate(&frame).unwrap();

    let location = match &localization.result {
        LocalizationResult::Found(location) => location,
        LocalizationResult::NotFound(reason) => panic!("object not found: {}", reason),
    };
    let (w, h) = (REF_W as f64, REF_H as f64);
    assert_corners(
        &location.corners,
        &[[dx, dy], [dx + w, dy], [dx + w, dy + h], [dx, dy + h]],
        1.0,
    );
    assert_abs_diff_eq!(location.area, w * h, epsilon = w + h);
    assert_abs_diff_eq!(location.homography[0][2], dx, epsilon = 1.0);
    assert_abs_diff_eq!(location.homography[1][2], dy, epsilon = 1.0);
}

#[test]
fn test_translated_object_across_pyramid() {
    let reference = textured_reference(REF_W, REF_H, 11);
    let locator = locator_for(&reference, &pyramid_config());

    let (dx, dy) = (64.0, 52.0);
    let frame = paste(&reference, 420, 310, 64, 52);
    let localization = locator.locate(&frame).unwrap();
    assert!(localization.keypoints.iter().any(|kp| kp.octave > 0));

    let location = match &localization.result {
        LocalizationResult::Found(location) => location,
        LocalizationResult::NotFound(reason) => panic!("object not found: {}", reason),
    };
    let (w, h) = (REF_W as f64, REF_H as f64);
    assert_corners(
        &location.corners,
        &[[dx, dy], [dx + w, dy], [dx + w, dy + h], [dx, dy + h]],
        1.0,
    );
    for m in &localization.matches {
        let kp = &localization.keypoints[m.train_idx];
        assert!(kp.x >= 0.0 && kp.x < 420.0 && kp.y >= 0.0 && kp.y < 310.0);
    }
}

#[test]
fn test_blank_frame_has_no_keypoints() {
    let locator = locator_for(&textured_reference(REF_W, REF_H, 2), &single_level_config());
    let blank = GrayImage::from_pixel(320, 240, image::Luma([128]));

    let localization = locator.locate(&blank).unwrap();
    assert_eq!(localization.result, LocalizationResult::NotFound(NotFoundReason::NoKeypoints));
    assert!(localization.matches.is_empty());
    assert!(localization.keypoints.is_empty());
}

#[test]
fn test_tiny_frame_is_not_an_error() {
    let locator = locator_for(&textured_reference(REF_W, REF_H, 3), &single_level_config());
    let tiny = textured_reference(30, 30, 3);

    let localization = locator.locate(&tiny).unwrap();
    assert_eq!(localization.result, LocalizationResult::NotFound(NotFoundReason::NoKeypoints));
}

#[test]
fn test_bgr8_frame_through_locator() {
    let reference = textured_reference(REF_W, REF_H, 4);
    let locator = locator_for(&reference, &single_level_config());
    let frame = paste(&reference, 360, 260, 50, 40);

    let msg = FrameMessage::bgr8("camera", frame.width(), frame.height(), to_bgr8(&frame));
    let decoded = msg.decode().unwrap();
    assert_eq!(decoded.gray, frame);

    let localization = locator.locate_frame(&decoded).unwrap();
    let location = localization.result.location().expect("object in bgr8 frame");
    assert_abs_diff_eq!(location.corners[0][0], 50.0, epsilon = 1.0);
    assert_abs_diff_eq!(location.corners[0][1], 40.0, epsilon = 1.0);
}

#[test]
fn test_open_calibration_from_disk() {
    let reference = textured_reference(REF_W, REF_H, 5);
    let path = std::env::temp_dir().join(format!("objrec_calibration_{}.png", std::process::id()));
    to_rgb(&reference).save(&path).unwrap();

    let config = single_level_config();
    let locator = ObjectLocator::open(&path, &config).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(locator.reference().width(), REF_W);
    assert_eq!(locator.reference().height(), REF_H);
    let frame = Frame::from_rgb(to_rgb(&reference));
    assert!(locator.locate_frame(&frame).unwrap().result.location().is_some());
}

#[test]
fn test_missing_calibration_is_an_error() {
    let config = single_level_config();
    assert!(ObjectLocator::open("/nonexistent/objrec/calibration.png", &config).is_err());
}

#[test]
fn test_node_processes_only_latest_frame() {
    let reference = textured_reference(REF_W, REF_H, 6);
    let node = Node::new(locator_for(&reference, &single_level_config()), 30.0).unwrap();

    let blank = GrayImage::from_pixel(300, 220, image::Luma([90]));
    let object = paste(&reference, 300, 220, 20, 20);

    assert!(node.arrive(FrameMessage::encoded("first", encode_png(&blank))).is_none());
    assert!(node.arrive(FrameMessage::encoded("second", encode_png(&blank))).is_some());
    let replaced = node.arrive(FrameMessage::encoded("third", encode_png(&object)));
    assert_eq!(replaced.map(|m| m.source), Some("second".to_string()));

    let processed = node.tick().expect("pending frame").unwrap();
    assert_eq!(processed.source, "third");
    assert!(processed.localization.result.location().is_some());

    // Consumed once
    assert!(node.tick().is_none());
    assert!(!node.gate().is_pending());
}

#[test]
fn test_node_skips_undecodable_frame() {
    let node = Node::new(locator_for(&textured_reference(REF_W, REF_H, 8), &single_level_config()), 30.0).unwrap();

    node.arrive(FrameMessage::encoded("junk", vec![0, 1, 2, 3]));
    assert!(node.tick().expect("pending frame").is_err());
    assert!(node.tick().is_none());
}

#[test]
fn test_node_rejects_bad_tick_rate() {
    let config = single_level_config();
    let locator = locator_for(&textured_reference(REF_W, REF_H, 9), &config);
    assert!(Node::new(locator.clone(), 0.0).is_err());
    assert!(Node::new(locator.clone(), f64::NAN).is_err());
    assert!(Node::new(locator, 1e-20).is_err());
}

#[test]
fn test_node_run_drains_source() {
    let reference = textured_reference(REF_W, REF_H, 10);
    let node = Node::new(locator_for(&reference, &single_level_config()), 200.0).unwrap();

    let object = encode_png(&paste(&reference, 320, 240, 30, 25));
    let messages = vec![
        FrameMessage::encoded("a", object.clone()),
        FrameMessage::encoded("b", vec![9, 9, 9]),
        FrameMessage::encoded("c", object),
    ];

    let mut seen = Vec::new();
    let stats = node.run(messages.into_iter(), Duration::from_millis(5), |processed| {
        seen.push(processed.source.clone());
    });

    assert_eq!(stats.received, 3);
    assert_eq!(stats.processed + stats.failed + stats.dropped, 3);
    assert_eq!(stats.found + stats.not_found, stats.processed);
    assert_eq!(seen.len(), stats.processed);
    assert!(stats.ticks >= stats.processed + stats.failed);
    // The last frame can never be superseded
    assert_eq!(seen.last().map(String::as_str), Some("c"));
    assert!(!node.gate().is_pending());
}
