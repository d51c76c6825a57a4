//! Proximity classifiers: is a hand or a phone-like object near the face?
//!
//! Both classifiers are pure functions of the current frame's inputs; all
//! temporal smoothing happens downstream in `debounce`.

use crate::detect::PhoneDetection;
use crate::landmarks::{HandLandmarks, HAND_KEY_POINTS};
use crate::BoundingBox;

/// Fixed pixel padding for the whole-hand fallback check.
const HAND_FALLBACK_PAD: f64 = 50.0;

/// True when any detected hand is near the face.
///
/// Primary test: wrist or a fingertip within a dynamic margin
/// (`margin_fraction * max(face_w, face_h)`) of the face center. Fallback:
/// any hand landmark inside the face box padded by 50 px.
pub fn hand_near_face(
    face_bbox: Option<BoundingBox>,
    hands: &[HandLandmarks],
    margin_fraction: f64,
) -> bool {
    let Some(face) = face_bbox else {
        return false;
    };
    if hands.is_empty() {
        return false;
    }

    let center = face.center();
    let dynamic_margin = face.width().max(face.height()) * margin_fraction;

    for hand in hands {
        for &idx in HAND_KEY_POINTS.iter() {
            if let Some(p) = hand.points.get(idx) {
                if p.distance(&center) < dynamic_margin {
                    return true;
                }
            }
        }
        if hand
            .points
            .iter()
            .any(|p| face.contains_padded(*p, HAND_FALLBACK_PAD))
        {
            return true;
        }
    }
    false
}

/// Phone-overlap classifier.
///
/// A detection qualifies when its box overlaps the face by more than
/// `overlap_threshold` of the face area. Returns the verdict and the best
/// overlap ratio across qualifying detections.
pub fn phone_near_face(
    face_bbox: Option<BoundingBox>,
    detections: &[PhoneDetection],
    overlap_threshold: f64,
) -> (bool, f64) {
    let Some(face) = face_bbox else {
        return (false, 0.0);
    };
    let face_area = face.area();
    if face_area <= 0.0 || detections.is_empty() {
        return (false, 0.0);
    }

    let mut max_confidence = 0.0f64;
    let mut near = false;
    for det in detections {
        let overlap_ratio = face.intersection_area(&det.bbox) / face_area;
        if overlap_ratio > overlap_threshold {
            near = true;
            max_confidence = max_confidence.max(overlap_ratio);
        }
    }
    (near, max_confidence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ObjectLabel;
    use crate::Point;

    fn face() -> BoundingBox {
        BoundingBox::new(200.0, 100.0, 400.0, 300.0)
    }

    fn hand_at(p: Point) -> HandLandmarks {
        // Wrist at `p`, the rest fanned out a little below it.
        let mut points = vec![p];
        for i in 1..21 {
            points.push(Point::new(p.x + i as f64 * 2.0, p.y + 30.0));
        }
        HandLandmarks::new(points)
    }

    fn phone(bbox: BoundingBox, confidence: f64) -> PhoneDetection {
        PhoneDetection {
            bbox,
            confidence,
            label: ObjectLabel::CellPhone,
        }
    }

    #[test]
    fn fingertip_inside_margin_triggers() {
        // Face center (300,200), margin 0.2 * 200 = 40.
        let hand = hand_at(Point::new(310.0, 210.0));
        assert!(hand_near_face(Some(face()), &[hand], 0.2));
    }

    #[test]
    fn distant_hand_does_not_trigger() {
        let hand = hand_at(Point::new(600.0, 450.0));
        assert!(!hand_near_face(Some(face()), &[hand], 0.2));
    }

    #[test]
    fn fallback_catches_landmark_in_padded_box() {
        // Outside the dynamic margin but inside the padded face box.
        let hand = hand_at(Point::new(395.0, 110.0));
        assert!(hand_near_face(Some(face()), &[hand], 0.05));
    }

    #[test]
    fn no_face_or_no_hands_is_false() {
        assert!(!hand_near_face(None, &[hand_at(Point::new(300.0, 200.0))], 0.2));
        assert!(!hand_near_face(Some(face()), &[], 0.2));
    }

    #[test]
    fn overlapping_phone_reports_ratio() {
        // Covers the left half of the face.
        let det = phone(BoundingBox::new(100.0, 100.0, 300.0, 300.0), 0.9);
        let (near, confidence) = phone_near_face(Some(face()), &[det], 0.1);
        assert!(near);
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn small_overlap_below_threshold_is_ignored() {
        let det = phone(BoundingBox::new(390.0, 290.0, 420.0, 330.0), 0.9);
        let (near, confidence) = phone_near_face(Some(face()), &[det], 0.1);
        assert!(!near);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn best_qualifying_overlap_wins() {
        let small = phone(BoundingBox::new(200.0, 100.0, 300.0, 200.0), 0.5);
        let large = phone(BoundingBox::new(200.0, 100.0, 400.0, 280.0), 0.5);
        let (near, confidence) = phone_near_face(Some(face()), &[small, large], 0.1);
        assert!(near);
        assert!(confidence > 0.5);
    }
}
