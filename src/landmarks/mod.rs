//! Landmark data model and provider backends.
//!
//! Landmark detection itself (face mesh, hand skeleton, body pose) is an
//! external collaborator; this module defines the structured inputs the
//! pipeline consumes and the `LandmarkProvider` trait a real backend plugs
//! into. A synthetic scripted provider is included for tests and the demo
//! daemon.
//!
//! Point sets are immutable per frame: a provider produces them, the
//! pipeline reads them, and they are dropped with the frame.

mod provider;
mod stub;

pub use provider::{resolve_provider, FrameLandmarks, LandmarkProvider};
pub use stub::{Scene, ScenePose, SyntheticLandmarkProvider};

use crate::{BoundingBox, Point};

// 68-point facial landmark scheme. Index groups follow the classic
// annotation: contour 0..16, brows 17..26, nose 27..35, eyes 36..47,
// mouth 48..67.
pub const FACE_POINT_COUNT: usize = 68;
pub const LEFT_EYE: [usize; 6] = [36, 37, 38, 39, 40, 41];
pub const RIGHT_EYE: [usize; 6] = [42, 43, 44, 45, 46, 47];
/// Outer-lip contour, 12 points starting at the left mouth corner.
pub const MOUTH: [usize; 12] = [48, 49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59];

// The six correspondence points for head-pose estimation.
pub const NOSE_TIP: usize = 33;
pub const CHIN: usize = 8;
pub const LEFT_EYE_OUTER: usize = 36;
pub const RIGHT_EYE_OUTER: usize = 45;
pub const LEFT_MOUTH_CORNER: usize = 48;
pub const RIGHT_MOUTH_CORNER: usize = 54;

// Hand landmark indices (21-point scheme): wrist plus the five fingertips.
pub const HAND_POINT_COUNT: usize = 21;
pub const HAND_KEY_POINTS: [usize; 6] = [0, 4, 8, 12, 16, 20];

// Body pose indices (33-point scheme); only shoulder and hip are consumed.
pub const POSE_LEFT_SHOULDER: usize = 11;
pub const POSE_LEFT_HIP: usize = 23;

/// One face's landmark set in image-pixel coordinates, ordered by the
/// 68-point scheme above.
#[derive(Clone, Debug, Default)]
pub struct FaceLandmarks {
    pub points: Vec<Point>,
}

impl FaceLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Face bounding box from the landmark extremes. None when the point set
    /// is empty.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    /// Points for a fixed index group, skipped when any index is out of
    /// range (short point lists from a degraded detector).
    pub fn select<const N: usize>(&self, indices: [usize; N]) -> Option<[Point; N]> {
        let mut out = [Point::default(); N];
        for (slot, &idx) in out.iter_mut().zip(indices.iter()) {
            *slot = *self.points.get(idx)?;
        }
        Some(out)
    }
}

/// One detected hand's landmark set in image-pixel coordinates.
#[derive(Clone, Debug, Default)]
pub struct HandLandmarks {
    pub points: Vec<Point>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }
}

/// Body pose landmarks in normalized [0,1] coordinates, as pose backends
/// report them. Only shoulder/hip vertical offsets are consumed.
#[derive(Clone, Debug, Default)]
pub struct PoseLandmarks {
    pub points: Vec<Point>,
}

impl PoseLandmarks {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn shoulder(&self) -> Option<Point> {
        self.points.get(POSE_LEFT_SHOULDER).copied()
    }

    pub fn hip(&self) -> Option<Point> {
        self.points.get(POSE_LEFT_HIP).copied()
    }
}
