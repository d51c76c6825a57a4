use std::collections::VecDeque;

use anyhow::Result;

use crate::frame::Frame;
use crate::BoundingBox;

use super::backend::{DetectionSettings, PhoneDetectorBackend, ROI_MARGIN};
use super::result::PhoneDetection;

/// Scripted phone detector for tests and the demo daemon.
///
/// Calls pop pre-loaded detection lists in order; once the script is
/// exhausted every call reports the configured steady-state list (empty by
/// default). The same confidence and box-area filters a real backend applies
/// run here too, so the pipeline is exercised end to end.
pub struct StubPhoneDetector {
    settings: DetectionSettings,
    script: VecDeque<Vec<PhoneDetection>>,
    steady_state: Vec<PhoneDetection>,
    calls: u64,
}

impl StubPhoneDetector {
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            settings,
            script: VecDeque::new(),
            steady_state: Vec::new(),
            calls: 0,
        }
    }

    /// Queue one call's worth of detections.
    pub fn push_result(&mut self, detections: Vec<PhoneDetection>) {
        self.script.push_back(detections);
    }

    /// Detections reported after the script runs out.
    pub fn with_steady_state(mut self, detections: Vec<PhoneDetection>) -> Self {
        self.steady_state = detections;
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    fn apply_filters(
        &self,
        detections: Vec<PhoneDetection>,
        frame: &Frame,
        roi: Option<BoundingBox>,
    ) -> Vec<PhoneDetection> {
        let frame_area = (frame.width as f64) * (frame.height as f64);
        let search = roi.map(|face| {
            BoundingBox::new(
                (face.x1 - ROI_MARGIN).max(0.0),
                (face.y1 - ROI_MARGIN).max(0.0),
                (face.x2 + ROI_MARGIN).min(frame.width as f64),
                (face.y2 + ROI_MARGIN).min(frame.height as f64),
            )
        });
        detections
            .into_iter()
            .filter(|det| det.confidence >= self.settings.confidence_threshold)
            .filter(|det| {
                frame_area > 0.0 && det.bbox.area() / frame_area >= self.settings.min_box_area_ratio
            })
            .filter(|det| match search {
                Some(region) => region.intersection_area(&det.bbox) > 0.0,
                None => true,
            })
            .collect()
    }
}

impl PhoneDetectorBackend for StubPhoneDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, frame: &Frame, roi: Option<BoundingBox>) -> Result<Vec<PhoneDetection>> {
        self.calls += 1;
        let raw = self
            .script
            .pop_front()
            .unwrap_or_else(|| self.steady_state.clone());
        Ok(self.apply_filters(raw, frame, roi))
    }
}
