//! Focus fusion: weighted score, veto conditions, status report.
//!
//! The verdict is two-tier. A convex combination of per-component
//! indicators gives the soft `focus_score`; a set of hard veto booleans
//! (phone, absent face, bad orientation, closed eyes, yawning) then forces
//! `focused = false` regardless of the score, so four good components can
//! never mask one disqualifying condition.

use serde::{Deserialize, Serialize};

use crate::headpose::HeadPose;
use crate::landmarks::PoseLandmarks;

/// Indicator value for a hand near the face; penalized less than a phone.
const HAND_INDICATOR: f64 = 0.7;

/// Per-component weights for the focus score. Must sum to 1.0; validated at
/// configuration load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusWeights {
    pub face_visibility: f64,
    pub orientation: f64,
    pub eye_open: f64,
    pub not_yawning: f64,
    pub phone_interaction: f64,
    pub hand_interaction: f64,
    pub posture: f64,
}

impl Default for FocusWeights {
    fn default() -> Self {
        Self {
            face_visibility: 0.20,
            orientation: 0.20,
            eye_open: 0.20,
            not_yawning: 0.10,
            phone_interaction: 0.15,
            hand_interaction: 0.05,
            posture: 0.10,
        }
    }
}

impl FocusWeights {
    pub fn sum(&self) -> f64 {
        self.face_visibility
            + self.orientation
            + self.eye_open
            + self.not_yawning
            + self.phone_interaction
            + self.hand_interaction
            + self.posture
    }
}

/// The debounced per-frame booleans feeding the fusion step.
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusSignals {
    pub face_visible: bool,
    pub orientation_good: bool,
    pub eye_closed: bool,
    pub yawning: bool,
    pub phone_near_face: bool,
    pub hand_near_face: bool,
    pub posture_stable: bool,
}

/// Orientation thresholds in degrees.
#[derive(Clone, Copy, Debug)]
pub struct OrientationLimits {
    pub yaw: f64,
    pub pitch: f64,
    pub tilt: f64,
}

/// Weighted focus score in [0, 1].
pub fn focus_score(signals: &FocusSignals, weights: &FocusWeights) -> f64 {
    let indicator = |good: bool| if good { 1.0 } else { 0.0 };
    let score = weights.face_visibility * indicator(signals.face_visible)
        + weights.orientation * indicator(signals.orientation_good)
        + weights.eye_open * indicator(!signals.eye_closed)
        + weights.not_yawning * indicator(!signals.yawning)
        + weights.phone_interaction * indicator(!signals.phone_near_face)
        + weights.hand_interaction
            * if signals.hand_near_face {
                HAND_INDICATOR
            } else {
                1.0
            }
        + weights.posture * indicator(signals.posture_stable);
    score.clamp(0.0, 1.0)
}

/// Final verdict: the score is necessary but not sufficient; any veto
/// condition forces false.
pub fn is_focused(score: f64, threshold: f64, signals: &FocusSignals) -> bool {
    score > threshold
        && !signals.phone_near_face
        && signals.face_visible
        && signals.orientation_good
        && !signals.eye_closed
        && !signals.yawning
}

/// Orientation predicate over a recovered head pose.
///
/// An unknown pose (solver failure with a visible face) is never good; the
/// no-face case is handled by the caller, where orientation is good by
/// convention so the face veto alone carries the verdict.
pub fn orientation_good(pose: &HeadPose, limits: &OrientationLimits) -> bool {
    pose.known
        && pose.yaw.abs() < limits.yaw
        && pose.pitch.abs() < limits.pitch
        && pose.head_tilt() < limits.tilt
}

/// Posture predicate: shoulder-to-hip vertical separation in normalized
/// coordinates as a proxy for "not slouched forward". Missing pose
/// landmarks count as stable.
pub fn posture_stable(pose: Option<&PoseLandmarks>, threshold: f64) -> bool {
    let Some(pose) = pose else {
        return true;
    };
    match (pose.shoulder(), pose.hip()) {
        (Some(shoulder), Some(hip)) => (hip.y - shoulder.y) > threshold,
        _ => true,
    }
}

// -------------------- Status report --------------------

/// Severity color attached to every status line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "green")]
    Good,
    #[serde(rename = "yellow")]
    Caution,
    #[serde(rename = "red")]
    Bad,
}

/// One human-readable status line.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusLine {
    pub text: String,
    pub color: Severity,
}

impl StatusLine {
    fn new(text: impl Into<String>, color: Severity) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }
}

/// Fixed set of status categories, one line per sub-system plus the overall
/// line chosen by priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusReport {
    pub face: StatusLine,
    pub orientation: StatusLine,
    pub eye: StatusLine,
    pub mouth: StatusLine,
    pub interaction: StatusLine,
    pub posture: StatusLine,
    pub overall: StatusLine,
}

/// Build the status report from the fused signals.
///
/// The overall line surfaces only the single highest-priority problem:
/// no-face > eyes-closed > yawning > phone > hand > bad-orientation >
/// bad-posture > focused.
pub fn status_report(
    signals: &FocusSignals,
    pose: &HeadPose,
    limits: &OrientationLimits,
    phone_confidence: f64,
) -> StatusReport {
    let face = if signals.face_visible {
        StatusLine::new("Face detected", Severity::Good)
    } else {
        StatusLine::new("No face detected", Severity::Bad)
    };

    let orientation = if signals.orientation_good {
        StatusLine::new("Looking forward", Severity::Good)
    } else {
        let text = if pose.known && pose.yaw.abs() > limits.yaw {
            "Turn head forward"
        } else if pose.known && pose.pitch.abs() > limits.pitch {
            "Look straight ahead"
        } else if pose.known && pose.head_tilt() > limits.tilt {
            "Straighten head"
        } else {
            "Adjust head orientation"
        };
        StatusLine::new(text, Severity::Bad)
    };

    let eye = if signals.eye_closed {
        StatusLine::new("Eyes closed", Severity::Bad)
    } else {
        StatusLine::new("Eyes open", Severity::Good)
    };

    let mouth = if signals.yawning {
        StatusLine::new("Yawning", Severity::Bad)
    } else {
        StatusLine::new("Normal", Severity::Good)
    };

    let interaction = if signals.phone_near_face {
        StatusLine::new(
            format!("Phone detected ({:.2})", phone_confidence),
            Severity::Bad,
        )
    } else if signals.hand_near_face {
        StatusLine::new("Hand near face", Severity::Caution)
    } else {
        StatusLine::new("No phone or hand near face", Severity::Good)
    };

    let posture = if signals.posture_stable {
        StatusLine::new("Upright posture", Severity::Good)
    } else {
        StatusLine::new("Sit upright", Severity::Bad)
    };

    let overall = if !signals.face_visible {
        StatusLine::new("No face detected", Severity::Bad)
    } else if signals.eye_closed {
        StatusLine::new("Eyes closed", Severity::Bad)
    } else if signals.yawning {
        StatusLine::new("Yawning detected", Severity::Bad)
    } else if signals.phone_near_face {
        StatusLine::new("Phone detected near face", Severity::Bad)
    } else if signals.hand_near_face {
        StatusLine::new("Hand near face", Severity::Caution)
    } else if !signals.orientation_good {
        StatusLine::new("Adjust head orientation", Severity::Bad)
    } else if !signals.posture_stable {
        StatusLine::new("Sit upright", Severity::Bad)
    } else {
        StatusLine::new("Focused and stable", Severity::Good)
    };

    StatusReport {
        face,
        orientation,
        eye,
        mouth,
        interaction,
        posture,
        overall,
    }
}
