use std::collections::VecDeque;

use anyhow::Result;

use crate::frame::Frame;
use crate::headpose;
use crate::Point;

use super::provider::{FrameLandmarks, LandmarkProvider};
use super::{
    FaceLandmarks, HandLandmarks, PoseLandmarks, CHIN, FACE_POINT_COUNT, HAND_POINT_COUNT,
    LEFT_EYE_OUTER, LEFT_MOUTH_CORNER, NOSE_TIP, POSE_LEFT_HIP, POSE_LEFT_SHOULDER, RIGHT_EYE,
    RIGHT_MOUTH_CORNER,
};

/// Ground-truth head pose for a synthetic scene, in degrees.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScenePose {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

/// One scripted frame's worth of scene state.
///
/// The provider turns a scene into landmark sets whose geometry reproduces
/// the requested EAR/MAR and whose six pose-correspondence points are exact
/// pinhole projections of the canonical model under the requested rotation,
/// so the full pipeline (ratios, PnP, proximity) runs on consistent inputs.
#[derive(Clone, Copy, Debug)]
pub struct Scene {
    pub face: Option<ScenePose>,
    pub ear: f64,
    pub mar: f64,
    pub hand_at: Option<Point>,
    pub slouched: bool,
}

impl Scene {
    /// Subject looking straight at the camera, eyes open, mouth closed.
    pub fn attentive() -> Self {
        Self {
            face: Some(ScenePose::default()),
            ear: 0.30,
            mar: 0.20,
            hand_at: None,
            slouched: false,
        }
    }

    /// Nobody in front of the camera.
    pub fn no_face() -> Self {
        Self {
            face: None,
            ..Self::attentive()
        }
    }

    pub fn with_ear(mut self, ear: f64) -> Self {
        self.ear = ear;
        self
    }

    pub fn with_mar(mut self, mar: f64) -> Self {
        self.mar = mar;
        self
    }

    pub fn with_pose(mut self, pitch: f64, yaw: f64, roll: f64) -> Self {
        self.face = Some(ScenePose { pitch, yaw, roll });
        self
    }

    pub fn with_hand_at(mut self, at: Point) -> Self {
        self.hand_at = Some(at);
        self
    }

    pub fn slouched(mut self) -> Self {
        self.slouched = true;
        self
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::attentive()
    }
}

/// Scripted landmark provider for tests and the demo daemon.
///
/// Scenes queued with `push_scene` are consumed one per frame; once the
/// script runs out the fallback scene repeats.
pub struct SyntheticLandmarkProvider {
    script: VecDeque<Scene>,
    fallback: Scene,
}

impl SyntheticLandmarkProvider {
    pub fn new(fallback: Scene) -> Self {
        Self {
            script: VecDeque::new(),
            fallback,
        }
    }

    pub fn push_scene(&mut self, scene: Scene) {
        self.script.push_back(scene);
    }

    pub fn extend_script(&mut self, scenes: impl IntoIterator<Item = Scene>) {
        self.script.extend(scenes);
    }
}

impl Default for SyntheticLandmarkProvider {
    fn default() -> Self {
        Self::new(Scene::attentive())
    }
}

impl LandmarkProvider for SyntheticLandmarkProvider {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn detect(&mut self, frame: &Frame) -> Result<FrameLandmarks> {
        let scene = self.script.pop_front().unwrap_or(self.fallback);
        Ok(build_scene(&scene, frame.width, frame.height))
    }
}

fn build_scene(scene: &Scene, width: u32, height: u32) -> FrameLandmarks {
    FrameLandmarks {
        face: scene
            .face
            .and_then(|pose| build_face(&pose, scene.ear, scene.mar, width, height)),
        hands: scene
            .hand_at
            .map(|at| vec![build_hand(at)])
            .unwrap_or_default(),
        pose: Some(build_body(scene.slouched)),
    }
}

/// Arm's-length subject distance in model units (millimetres).
const SUBJECT_DISTANCE: f64 = 1000.0;

fn build_face(pose: &ScenePose, ear: f64, mar: f64, width: u32, height: u32) -> Option<FaceLandmarks> {
    let rotation = headpose::rotation_from_euler_deg(pose.pitch, pose.yaw, pose.roll);
    let translation = [0.0, 0.0, SUBJECT_DISTANCE];
    let anchors = headpose::project_model(&rotation, &translation, width, height)?;
    let [nose, chin, left_eye, right_eye, left_mouth, right_mouth] = anchors;

    let eye_span = left_eye.distance(&right_eye);
    let eye_width = eye_span * 0.25;

    // Coarse face oval for the landmark indices nothing downstream reads
    // individually; they only shape the face bounding box.
    let center = Point::new(
        (nose.x + chin.x) / 2.0,
        (left_eye.y + right_eye.y + chin.y * 2.0) / 4.0,
    );
    let mut points = Vec::with_capacity(FACE_POINT_COUNT);
    for i in 0..FACE_POINT_COUNT {
        let angle = i as f64 / FACE_POINT_COUNT as f64 * std::f64::consts::TAU;
        points.push(Point::new(
            center.x + eye_span * 0.70 * angle.cos(),
            center.y + eye_span * 0.85 * angle.sin(),
        ));
    }

    points[NOSE_TIP] = nose;
    points[CHIN] = chin;
    place_eye(&mut points, LEFT_EYE_OUTER, left_eye, eye_width, ear, false);
    place_eye(&mut points, RIGHT_EYE[0], right_eye, eye_width, ear, true);
    place_mouth(&mut points, left_mouth, right_mouth, mar);

    Some(FaceLandmarks::new(points))
}

/// Six-point eye contour reproducing the requested EAR: both lid pairs sit
/// `ear * eye_width` apart.
fn place_eye(
    points: &mut [Point],
    base_index: usize,
    outer_corner: Point,
    eye_width: f64,
    ear: f64,
    mirrored: bool,
) {
    let gap = ear * eye_width;
    // For the right eye the group starts at the inner corner and the outer
    // corner is p3 (index 45), so anchor the contour accordingly.
    let start = if mirrored {
        Point::new(outer_corner.x - eye_width, outer_corner.y)
    } else {
        outer_corner
    };
    let at = |t: f64, dy: f64| Point::new(start.x + t * eye_width, start.y + dy);
    points[base_index] = start;
    points[base_index + 1] = at(1.0 / 3.0, -gap / 2.0);
    points[base_index + 2] = at(2.0 / 3.0, -gap / 2.0);
    points[base_index + 3] = at(1.0, 0.0);
    points[base_index + 4] = at(2.0 / 3.0, gap / 2.0);
    points[base_index + 5] = at(1.0 / 3.0, gap / 2.0);
}

/// Twelve-point outer-lip contour reproducing the requested MAR.
fn place_mouth(points: &mut [Point], left_corner: Point, right_corner: Point, mar: f64) {
    let width = left_corner.distance(&right_corner);
    let gap = mar * width;
    let along = |t: f64| {
        Point::new(
            left_corner.x + t * (right_corner.x - left_corner.x),
            left_corner.y + t * (right_corner.y - left_corner.y),
        )
    };
    points[LEFT_MOUTH_CORNER] = left_corner;
    points[RIGHT_MOUTH_CORNER] = right_corner;
    for i in 1..6usize {
        let t = i as f64 / 6.0;
        let upper = along(t);
        let lower = along(1.0 - t);
        points[LEFT_MOUTH_CORNER + i] = Point::new(upper.x, upper.y - gap / 2.0);
        points[RIGHT_MOUTH_CORNER + i] = Point::new(lower.x, lower.y + gap / 2.0);
    }
    // Inner-lip ring, slightly inside the outer contour.
    for i in 0..8usize {
        let t = 0.2 + 0.6 * (i as f64 / 7.0);
        let base = along(t);
        let dy = if i < 4 { -gap / 4.0 } else { gap / 4.0 };
        points[60 + i] = Point::new(base.x, base.y + dy);
    }
}

/// 21-point hand fanned out around the requested wrist position.
fn build_hand(at: Point) -> HandLandmarks {
    let mut points = Vec::with_capacity(HAND_POINT_COUNT);
    points.push(at);
    for i in 1..HAND_POINT_COUNT {
        let angle = i as f64 * 0.3;
        let radius = 25.0 + (i % 5) as f64 * 8.0;
        points.push(Point::new(
            at.x + radius * angle.cos(),
            at.y + radius * angle.sin(),
        ));
    }
    HandLandmarks::new(points)
}

/// 33-point body pose in normalized coordinates; only shoulder and hip are
/// meaningful.
fn build_body(slouched: bool) -> PoseLandmarks {
    let mut points = vec![Point::new(0.5, 0.5); 33];
    points[POSE_LEFT_SHOULDER] = Point::new(0.5, 0.40);
    points[POSE_LEFT_HIP] = if slouched {
        Point::new(0.5, 0.60)
    } else {
        Point::new(0.5, 0.78)
    };
    PoseLandmarks::new(points)
}
