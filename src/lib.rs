//! Focus Kernel
//!
//! This crate implements the core scoring pipeline for a webcam-based
//! attention tracker.
//!
//! # Architecture
//!
//! Each frame flows through a fixed pipeline:
//!
//! 1. **Landmarks**: an external provider yields face/hand/pose landmark sets
//!    (`landmarks` module; model inference itself lives outside this crate).
//! 2. **Features**: eye-aspect-ratio, mouth-aspect-ratio and head pose are
//!    derived geometrically (`features`, `headpose`).
//! 3. **Proximity**: hand-near-face and phone-near-face heuristics over the
//!    face bounding box (`proximity`).
//! 4. **Debounce**: noisy per-frame booleans become stable signals via
//!    consecutive-frame counters and cooldown windows (`debounce`).
//! 5. **Fusion**: a weighted score plus hard veto conditions produce the
//!    focused/distracted verdict and a status report (`fusion`).
//!
//! The `tracker` module drives the pipeline and owns all cross-frame state;
//! the heavier phone detector runs on a background worker with a single-slot
//! result cache (`detect`).
//!
//! # Module Structure
//!
//! - `frame`: pixel frames and frame sources (synthetic `stub://` included)
//! - `landmarks`: landmark data model and provider backends
//! - `detect`: phone/object detection backends and the background worker
//! - `config`: layered file + env configuration
//! - Core pipeline: `features`, `headpose`, `proximity`, `debounce`, `fusion`
//! - `tracker`: the per-frame orchestrator

use serde::{Deserialize, Serialize};

pub mod config;
pub mod debounce;
pub mod detect;
pub mod features;
pub mod frame;
pub mod fusion;
pub mod headpose;
pub mod landmarks;
pub mod proximity;
pub mod tracker;

pub use config::{OrientationProfile, TrackerConfig};
pub use detect::{ObjectLabel, PhoneDetection, PhoneDetectorBackend, StubPhoneDetector};
pub use frame::{Frame, FrameSource, SourceConfig, SyntheticSource};
pub use fusion::{Severity, StatusLine, StatusReport};
pub use headpose::HeadPose;
pub use landmarks::{
    FaceLandmarks, FrameLandmarks, HandLandmarks, LandmarkProvider, PoseLandmarks,
    SyntheticLandmarkProvider,
};
pub use tracker::{FocusMetrics, FocusTracker};

// -------------------- Geometry primitives --------------------

/// 2D point in image-pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Axis-aligned rectangle in pixel coordinates (x1,y1 top-left, x2,y2
/// bottom-right). Face boxes are recomputed from landmarks every frame and
/// never reused across frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Intersection area with another box. Symmetric.
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let overlap_x = (self.x2.min(other.x2) - self.x1.max(other.x1)).max(0.0);
        let overlap_y = (self.y2.min(other.y2) - self.y1.max(other.y1)).max(0.0);
        overlap_x * overlap_y
    }

    /// True when the point falls inside the box expanded by `pad` pixels on
    /// every side.
    pub fn contains_padded(&self, p: Point, pad: f64) -> bool {
        p.x > self.x1 - pad && p.x < self.x2 + pad && p.y > self.y1 - pad && p.y < self.y2 + pad
    }

    /// Tight bounding box of a point set. None for an empty set.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bbox = BoundingBox::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            bbox.x1 = bbox.x1.min(p.x);
            bbox.y1 = bbox.y1.min(p.y);
            bbox.x2 = bbox.x2.max(p.x);
            bbox.y2 = bbox.y2.max(p.y);
        }
        Some(bbox)
    }
}
