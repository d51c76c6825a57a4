//! End-to-end pipeline scenarios: scripted scenes and detections in, the
//! focused/distracted verdict out.

use focus_kernel::detect::{DetectionSettings, ObjectLabel, PhoneDetection, StubPhoneDetector};
use focus_kernel::landmarks::{Scene, SyntheticLandmarkProvider};
use focus_kernel::{BoundingBox, FocusTracker, Frame, OrientationProfile, Point, TrackerConfig};

/// Deterministic config: inline detection on every frame.
fn test_config() -> TrackerConfig {
    let mut config = TrackerConfig::default();
    config.detection.background = false;
    config.detection.frame_skip = 1;
    config
}

fn phone(bbox: BoundingBox) -> PhoneDetection {
    PhoneDetection {
        bbox,
        confidence: 0.9,
        label: ObjectLabel::CellPhone,
    }
}

/// A box the synthetic face always overlaps by well over half.
fn phone_over_face() -> PhoneDetection {
    phone(BoundingBox::new(0.0, 0.0, 480.0, 480.0))
}

fn tracker(
    provider: SyntheticLandmarkProvider,
    detector: StubPhoneDetector,
    config: TrackerConfig,
) -> FocusTracker {
    let mut tracker = FocusTracker::with_backends(config, Box::new(provider), Box::new(detector));
    tracker.start().expect("start tracker");
    tracker
}

#[test]
fn attentive_subject_is_focused_and_stable() {
    let provider = SyntheticLandmarkProvider::new(Scene::attentive().with_ear(0.30).with_mar(0.20));
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(metrics.face_visible);
    assert!(metrics.orientation_good);
    assert!(!metrics.eye_closed);
    assert!(!metrics.yawning);
    assert!(!metrics.phone_near_face);
    assert!(metrics.posture_stable);
    assert!(metrics.focused);
    assert!((metrics.focus_score - 1.0).abs() < 1e-9);
    assert_eq!(metrics.status_messages.overall.text, "Focused and stable");
}

#[test]
fn overlapping_phone_vetoes_an_otherwise_perfect_frame() {
    let provider = SyntheticLandmarkProvider::new(Scene::attentive());
    let detector =
        StubPhoneDetector::new(DetectionSettings::default()).with_steady_state(vec![phone_over_face()]);
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(metrics.phone_near_face);
    assert!(metrics.phone_confidence > 0.0);
    // Every other component is ideal; the veto still wins.
    assert!(metrics.face_visible && metrics.orientation_good && !metrics.eye_closed);
    assert!(!metrics.focused);
    assert_eq!(
        metrics.status_messages.overall.text,
        "Phone detected near face"
    );
}

#[test]
fn eye_closure_debounces_across_exactly_three_frames() {
    let mut provider = SyntheticLandmarkProvider::new(Scene::attentive());
    for _ in 0..3 {
        provider.push_scene(Scene::attentive().with_ear(0.15));
    }
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let frame = Frame::blank(640, 480);
    let first = tracker.process_frame(&frame).unwrap();
    let second = tracker.process_frame(&frame).unwrap();
    let third = tracker.process_frame(&frame).unwrap();
    assert!(!first.eye_closed);
    assert!(!second.eye_closed);
    assert!(third.eye_closed);
    assert!(!third.focused);
    assert_eq!(third.status_messages.overall.text, "Eyes closed");

    // Fallback scene reopens the eyes; the state resets immediately.
    let fourth = tracker.process_frame(&frame).unwrap();
    assert!(!fourth.eye_closed);
}

#[test]
fn blink_shorter_than_the_debounce_never_registers() {
    let mut provider = SyntheticLandmarkProvider::new(Scene::attentive());
    provider.push_scene(Scene::attentive().with_ear(0.12));
    provider.push_scene(Scene::attentive().with_ear(0.12));
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let frame = Frame::blank(640, 480);
    for _ in 0..4 {
        assert!(!tracker.process_frame(&frame).unwrap().eye_closed);
    }
}

#[test]
fn empty_frame_reports_no_face() {
    let provider = SyntheticLandmarkProvider::new(Scene::no_face());
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(!metrics.face_visible);
    assert!(!metrics.focused);
    assert_eq!(metrics.status_messages.overall.text, "No face detected");
    // Safe defaults, and orientation is never blamed for an absent face.
    assert_eq!(metrics.ear, 0.0);
    assert_eq!(metrics.yaw, 0.0);
    assert!(metrics.orientation_good);
}

#[test]
fn yawning_vetoes_focus() {
    let provider = SyntheticLandmarkProvider::new(Scene::attentive().with_mar(0.95));
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(metrics.yawning);
    assert!(!metrics.focused);
    assert_eq!(metrics.status_messages.overall.text, "Yawning detected");
}

#[test]
fn turned_head_fails_strict_but_passes_lenient() {
    let frame = Frame::blank(640, 480);

    let provider = SyntheticLandmarkProvider::new(Scene::attentive().with_pose(0.0, 22.0, 0.0));
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut strict = tracker(provider, detector, test_config());
    let metrics = strict.process_frame(&frame).unwrap();
    assert!(!metrics.orientation_good, "yaw 22 within strict limits?");
    assert!(!metrics.focused);

    let mut config = test_config();
    config.orientation_profile = OrientationProfile::Lenient;
    let provider = SyntheticLandmarkProvider::new(Scene::attentive().with_pose(0.0, 22.0, 0.0));
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut lenient = tracker(provider, detector, config);
    let metrics = lenient.process_frame(&frame).unwrap();
    assert!(metrics.orientation_good);
    assert!(metrics.focused);
}

#[test]
fn hand_with_phones_in_view_counts_as_phone_use() {
    // Hand at the face but the phone box nowhere near the face overlap
    // threshold: the combined rule still flags phone use.
    let provider = SyntheticLandmarkProvider::new(
        Scene::attentive().with_hand_at(Point::new(320.0, 240.0)),
    );
    let detector = StubPhoneDetector::new(DetectionSettings::default())
        .with_steady_state(vec![phone(BoundingBox::new(560.0, 380.0, 640.0, 480.0))]);
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(metrics.hand_near_face);
    assert!(metrics.phone_near_face);
    assert!((metrics.phone_confidence - 0.9).abs() < 1e-9);
    assert!(!metrics.focused);
}

#[test]
fn hand_alone_only_cautions() {
    let provider = SyntheticLandmarkProvider::new(
        Scene::attentive().with_hand_at(Point::new(320.0, 240.0)),
    );
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(metrics.hand_near_face);
    assert!(!metrics.phone_near_face);
    assert!(metrics.focused, "hand alone must not veto");
    assert_eq!(metrics.status_messages.overall.text, "Hand near face");
}

#[test]
fn slouching_lowers_the_score_without_vetoing() {
    let provider = SyntheticLandmarkProvider::new(Scene::attentive().slouched());
    let detector = StubPhoneDetector::new(DetectionSettings::default());
    let mut tracker = tracker(provider, detector, test_config());

    let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
    assert!(!metrics.posture_stable);
    assert!((metrics.focus_score - 0.9).abs() < 1e-9);
    assert!(metrics.focused);
    assert_eq!(metrics.status_messages.overall.text, "Sit upright");
}

#[test]
fn phone_alert_fires_once_per_cooldown_window() {
    let mut config = test_config();
    config.detection.streak_required = 3;
    config.detection.cooldown_secs = 3.0;

    let provider = SyntheticLandmarkProvider::new(Scene::attentive());
    let detector =
        StubPhoneDetector::new(DetectionSettings::default()).with_steady_state(vec![phone_over_face()]);
    let mut tracker = tracker(provider, detector, config);

    let frame = Frame::blank(640, 480);
    let mut alerts = 0;
    for _ in 0..50 {
        if tracker.process_frame(&frame).unwrap().phone_alert {
            alerts += 1;
        }
    }
    // 50 consecutive hit frames processed well inside one cooldown window.
    assert_eq!(alerts, 1);
}
