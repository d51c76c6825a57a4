//! Geometric feature extraction from facial landmarks.
//!
//! Eye aspect ratio (EAR) and mouth aspect ratio (MAR) are scalar proxies
//! for how open the eyes and mouth are. Both are pure functions of the
//! current frame's landmark points; degenerate contours (zero horizontal
//! span) yield `None` so the caller can skip the frame's evaluation instead
//! of dividing by zero.

use crate::landmarks::{FaceLandmarks, LEFT_EYE, MOUTH, RIGHT_EYE};
use crate::Point;

const MIN_SPAN: f64 = 1e-6;

/// EAR for one eye contour: horizontal corners p0/p3, vertical lid pairs
/// p1/p5 and p2/p4.
///
/// `EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3|)`
pub fn eye_aspect_ratio(eye: &[Point; 6]) -> Option<f64> {
    let horizontal = eye[0].distance(&eye[3]);
    if horizontal < MIN_SPAN {
        return None;
    }
    let vertical_a = eye[1].distance(&eye[5]);
    let vertical_b = eye[2].distance(&eye[4]);
    Some((vertical_a + vertical_b) / (2.0 * horizontal))
}

/// MAR for a 12-point outer-lip contour: corners m0/m6, vertical pairs
/// m2/m10 and m4/m8.
///
/// `MAR = (|m2-m10| + |m4-m8|) / (2 * |m0-m6|)`
pub fn mouth_aspect_ratio(mouth: &[Point; 12]) -> Option<f64> {
    let horizontal = mouth[0].distance(&mouth[6]);
    if horizontal < MIN_SPAN {
        return None;
    }
    let vertical_a = mouth[2].distance(&mouth[10]);
    let vertical_b = mouth[4].distance(&mouth[8]);
    Some((vertical_a + vertical_b) / (2.0 * horizontal))
}

/// Binocular EAR: mean of left and right eye, from the face landmark set.
///
/// None when either eye is degenerate or the landmark list is short; the
/// frame's eye evaluation is skipped in that case.
pub fn face_ear(face: &FaceLandmarks) -> Option<f64> {
    let left = eye_aspect_ratio(&face.select(LEFT_EYE)?)?;
    let right = eye_aspect_ratio(&face.select(RIGHT_EYE)?)?;
    Some((left + right) / 2.0)
}

/// MAR from the face landmark set's outer-lip contour.
pub fn face_mar(face: &FaceLandmarks) -> Option<f64> {
    mouth_aspect_ratio(&face.select(MOUTH)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Eye contour with corners `w` apart and both lid pairs `open` apart.
    fn eye_points(open: f64, w: f64) -> [Point; 6] {
        [
            Point::new(0.0, 0.0),
            Point::new(w / 3.0, -open / 2.0),
            Point::new(2.0 * w / 3.0, -open / 2.0),
            Point::new(w, 0.0),
            Point::new(2.0 * w / 3.0, open / 2.0),
            Point::new(w / 3.0, open / 2.0),
        ]
    }

    #[test]
    fn ear_matches_construction() {
        // Lid separation of open*w at both pairs gives EAR == open.
        let eye = eye_points(0.3 * 40.0, 40.0);
        let ear = eye_aspect_ratio(&eye).unwrap();
        assert!((ear - 0.3).abs() < 1e-9);
    }

    #[test]
    fn ear_decreases_as_lids_close() {
        let open = eye_aspect_ratio(&eye_points(12.0, 40.0)).unwrap();
        let half = eye_aspect_ratio(&eye_points(6.0, 40.0)).unwrap();
        let shut = eye_aspect_ratio(&eye_points(0.5, 40.0)).unwrap();
        assert!(open > half && half > shut);
        assert!(shut >= 0.0);
    }

    #[test]
    fn degenerate_eye_is_rejected() {
        let collapsed = [Point::new(5.0, 5.0); 6];
        assert!(eye_aspect_ratio(&collapsed).is_none());
    }

    #[test]
    fn mar_bounds_and_monotonicity() {
        let mouth = |gap: f64| -> [Point; 12] {
            let mut m = [Point::default(); 12];
            let w = 60.0;
            for (i, p) in m.iter_mut().enumerate() {
                let x = (i % 7) as f64 * w / 6.0;
                *p = Point::new(x, 0.0);
            }
            m[0] = Point::new(0.0, 0.0);
            m[6] = Point::new(w, 0.0);
            m[2] = Point::new(w / 3.0, -gap / 2.0);
            m[10] = Point::new(w / 3.0, gap / 2.0);
            m[4] = Point::new(2.0 * w / 3.0, -gap / 2.0);
            m[8] = Point::new(2.0 * w / 3.0, gap / 2.0);
            m
        };
        let open = mouth_aspect_ratio(&mouth(55.0)).unwrap();
        let closed = mouth_aspect_ratio(&mouth(8.0)).unwrap();
        assert!(open > closed);
        assert!(closed >= 0.0);
    }

    #[test]
    fn short_landmark_list_skips_evaluation() {
        let face = FaceLandmarks::new(vec![Point::new(1.0, 1.0); 20]);
        assert!(face_ear(&face).is_none());
        assert!(face_mar(&face).is_none());
    }
}
