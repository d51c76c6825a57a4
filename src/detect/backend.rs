use anyhow::{anyhow, Result};

use crate::frame::Frame;
use crate::BoundingBox;

use super::result::PhoneDetection;

/// Pixel margin added around the face box when a region-of-interest hint is
/// supplied; phones held near the face sit well outside the face box itself.
pub const ROI_MARGIN: f64 = 200.0;

/// Filtering applied by every backend before detections are reported.
#[derive(Clone, Copy, Debug)]
pub struct DetectionSettings {
    /// Minimum detector confidence for a box to count.
    pub confidence_threshold: f64,
    /// Minimum box area as a fraction of frame area; specks are noise.
    pub min_box_area_ratio: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.4,
            min_box_area_ratio: 0.01,
        }
    }
}

/// Phone detector backend.
///
/// Implementations wrap an external object-detection model. They must treat
/// frame pixels as read-only and ephemeral, report boxes in full-frame pixel
/// coordinates even when detecting inside a region of interest, and apply
/// the `DetectionSettings` filters before returning.
pub trait PhoneDetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame. `roi` is an optional face-box hint; the
    /// backend may restrict its search to that region expanded by
    /// `ROI_MARGIN` pixels.
    fn detect(&mut self, frame: &Frame, roi: Option<BoundingBox>) -> Result<Vec<PhoneDetection>>;

    /// Optional warm-up hook (model load etc.).
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Resolve a detector backend by configured name, once at startup.
pub fn resolve_detector(
    backend: &str,
    settings: DetectionSettings,
) -> Result<Box<dyn PhoneDetectorBackend>> {
    match backend {
        "stub" => Ok(Box::new(super::StubPhoneDetector::new(settings))),
        other => Err(anyhow!("unknown detector backend '{}'", other)),
    }
}
