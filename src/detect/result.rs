use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Object class reported by a detection backend.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectLabel {
    /// Phones are occasionally classed as remotes by the detector, so both
    /// labels count as phone-like.
    #[serde(rename = "cell phone")]
    CellPhone,
    #[serde(rename = "remote")]
    Remote,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

/// One phone-like detection on a frame.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PhoneDetection {
    /// Bounding box in pixel coordinates.
    pub bbox: BoundingBox,
    /// Detector confidence in [0, 1].
    pub confidence: f64,
    pub label: ObjectLabel,
}
