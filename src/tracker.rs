//! Per-frame orchestrator.
//!
//! `FocusTracker` owns every piece of cross-frame state: the debounce
//! counters, the FPS window, and the background detection worker with its
//! cached results. One `process_frame` call runs the full pipeline and
//! returns an immutable `FocusMetrics` snapshot for the frame; the
//! rendering/transport layer consumes it and drops it.
//!
//! Lifecycle is `Idle -> Running -> Stopped`. Processing outside `Running`
//! fails; `stop` joins the worker and releases the backends within one
//! call.

use std::collections::VecDeque;
use std::time::Instant;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::TrackerConfig;
use crate::debounce::{EyeClosureDebounce, PhoneStreakDebounce};
use crate::detect::{resolve_detector, DetectionWorker, PhoneDetection, PhoneDetectorBackend};
use crate::features;
use crate::frame::Frame;
use crate::fusion::{self, FocusSignals, StatusReport};
use crate::headpose::{self, HeadPose};
use crate::landmarks::{resolve_provider, LandmarkProvider};
use crate::proximity;

const FPS_WINDOW: usize = 10;

/// Frame-scoped, immutable metrics snapshot. Field names are the wire
/// contract consumed by overlay and transport front ends.
#[derive(Clone, Debug, Serialize)]
pub struct FocusMetrics {
    pub focused: bool,
    pub focus_score: f64,
    pub face_visible: bool,
    pub orientation_good: bool,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
    pub head_tilt: f64,
    pub ear: f64,
    pub mar: f64,
    pub eye_closed: bool,
    pub yawning: bool,
    pub phone_near_face: bool,
    pub hand_near_face: bool,
    pub phone_confidence: f64,
    pub posture_stable: bool,
    pub phone_alert: bool,
    pub phone_objects: Vec<PhoneDetection>,
    pub status_messages: StatusReport,
    pub fps: f64,
}

/// Tracker lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrackerState {
    Idle,
    Running,
    Stopped,
}

/// Rolling mean over the last few instantaneous FPS samples.
#[derive(Debug, Default)]
struct FpsCounter {
    last_frame_at: Option<Instant>,
    history: VecDeque<f64>,
}

impl FpsCounter {
    fn tick(&mut self, now: Instant) -> f64 {
        if let Some(last) = self.last_frame_at {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                self.history.push_back(1.0 / dt);
                while self.history.len() > FPS_WINDOW {
                    self.history.pop_front();
                }
            }
        }
        self.last_frame_at = Some(now);
        if self.history.is_empty() {
            0.0
        } else {
            self.history.iter().sum::<f64>() / self.history.len() as f64
        }
    }
}

/// The attention tracker.
pub struct FocusTracker {
    config: TrackerConfig,
    provider: Box<dyn LandmarkProvider>,
    worker: DetectionWorker,
    state: TrackerState,
    frame_count: u64,
    eye_debounce: EyeClosureDebounce,
    phone_debounce: PhoneStreakDebounce,
    fps: FpsCounter,
}

impl FocusTracker {
    /// Build a tracker with backends resolved from configuration.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        let provider = resolve_provider(&config.landmark_backend)?;
        let detector = resolve_detector(&config.detector_backend, config.detection_settings())?;
        Ok(Self::with_backends(config, provider, detector))
    }

    /// Build a tracker around explicit backend instances (tests, embedding).
    pub fn with_backends(
        config: TrackerConfig,
        provider: Box<dyn LandmarkProvider>,
        detector: Box<dyn PhoneDetectorBackend>,
    ) -> Self {
        let eye_debounce = EyeClosureDebounce::new(
            config.thresholds.eye_ar,
            config.thresholds.eye_ar_consec_frames,
        );
        let phone_debounce =
            PhoneStreakDebounce::new(config.detection.streak_required, config.cooldown());
        Self {
            provider,
            worker: DetectionWorker::new(detector),
            state: TrackerState::Idle,
            frame_count: 0,
            eye_debounce,
            phone_debounce,
            fps: FpsCounter::default(),
            config,
        }
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Transition `Idle -> Running`.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            TrackerState::Idle => {
                self.state = TrackerState::Running;
                log::info!(
                    "tracker running: landmarks={}, detector every {} frame(s)",
                    self.provider.name(),
                    self.config.detection.frame_skip
                );
                Ok(())
            }
            TrackerState::Running => Ok(()),
            TrackerState::Stopped => bail!("tracker already stopped"),
        }
    }

    /// Process one captured frame through the full pipeline.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FocusMetrics> {
        if self.state != TrackerState::Running {
            bail!("tracker is not running");
        }
        self.frame_count += 1;
        let now = Instant::now();

        let landmarks = self.provider.detect(frame)?;

        // Face geometry. No face is a valid state, not an error: safe
        // defaults flow through and the face veto carries the verdict.
        let face_bbox = landmarks.face.as_ref().and_then(|face| face.bounding_box());
        let face_visible = face_bbox.is_some();

        let mut ear = None;
        let mut mar = None;
        let mut pose = HeadPose::unknown();
        if let Some(face) = landmarks.face.as_ref().filter(|_| face_visible) {
            ear = features::face_ear(face);
            mar = features::face_mar(face);
            pose = headpose::estimate(face, frame.width, frame.height);
        }

        let limits = self.config.orientation_limits();
        // Orientation is good by convention when there is no face to
        // evaluate; otherwise an unknown pose is never good.
        let orientation_good = !face_visible || fusion::orientation_good(&pose, &limits);

        let eye_closed = if face_visible {
            self.eye_debounce.update(ear)
        } else {
            false
        };
        let yawning = face_visible
            && mar
                .map(|value| value > self.config.thresholds.mouth_ar)
                .unwrap_or(false);

        let hand_near_face = proximity::hand_near_face(
            face_bbox,
            &landmarks.hands,
            self.config.thresholds.hand_margin_fraction,
        );

        // Kick the expensive detector every Kth frame; cached results cover
        // the frames in between.
        if self.frame_count % self.config.detection.frame_skip as u64 == 0 {
            if self.config.detection.background {
                self.worker.submit(frame.clone(), face_bbox);
            } else {
                self.worker.detect_blocking(frame, face_bbox);
            }
        }
        let phone_objects = self.worker.latest();

        let phone_alert = self.phone_debounce.update(!phone_objects.is_empty(), now);
        if phone_alert {
            log::warn!(
                "phone alert: sustained detection over {} frames",
                self.config.detection.streak_required
            );
        }

        let (mut phone_near_face, mut phone_confidence) = proximity::phone_near_face(
            face_bbox,
            &phone_objects,
            self.config.detection.overlap_threshold,
        );
        // A hand at the face while phones are in view counts as phone use
        // even without box overlap (phone held against the ear).
        if hand_near_face && !phone_objects.is_empty() {
            phone_near_face = true;
            let best = phone_objects
                .iter()
                .map(|det| det.confidence)
                .fold(0.0f64, f64::max);
            phone_confidence = phone_confidence.max(best);
        }

        let posture_stable =
            fusion::posture_stable(landmarks.pose.as_ref(), self.config.thresholds.posture);

        let signals = FocusSignals {
            face_visible,
            orientation_good,
            eye_closed,
            yawning,
            phone_near_face,
            hand_near_face,
            posture_stable,
        };
        let focus_score = fusion::focus_score(&signals, &self.config.weights);
        let focused = fusion::is_focused(focus_score, self.config.thresholds.focus_score, &signals);
        let status_messages = fusion::status_report(&signals, &pose, &limits, phone_confidence);

        let fps = self.fps.tick(now);

        Ok(FocusMetrics {
            focused,
            focus_score,
            face_visible,
            orientation_good,
            yaw: pose.yaw,
            pitch: pose.pitch,
            roll: pose.roll,
            head_tilt: pose.head_tilt(),
            ear: ear.unwrap_or(0.0),
            mar: mar.unwrap_or(0.0),
            eye_closed,
            yawning,
            phone_near_face,
            hand_near_face,
            phone_confidence,
            posture_stable,
            phone_alert,
            phone_objects,
            status_messages,
            fps,
        })
    }

    /// Transition to `Stopped`: join the worker and release the backends.
    /// Further `process_frame` calls fail.
    pub fn stop(&mut self) {
        if self.state == TrackerState::Stopped {
            return;
        }
        self.worker.join();
        self.state = TrackerState::Stopped;
        log::info!("tracker stopped after {} frames", self.frame_count);
    }

    /// Alias for `stop`; kept for callers thinking in acquire/release terms.
    pub fn release(&mut self) {
        self.stop();
    }
}

impl Drop for FocusTracker {
    fn drop(&mut self) {
        if self.state == TrackerState::Running {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{DetectionSettings, StubPhoneDetector};
    use crate::landmarks::{Scene, SyntheticLandmarkProvider};

    fn inline_config() -> TrackerConfig {
        let mut config = TrackerConfig::default();
        config.detection.background = false;
        config
    }

    fn tracker_with(scene: Scene, config: TrackerConfig) -> FocusTracker {
        let provider = SyntheticLandmarkProvider::new(scene);
        let detector = StubPhoneDetector::new(config.detection_settings());
        FocusTracker::with_backends(config, Box::new(provider), Box::new(detector))
    }

    #[test]
    fn process_requires_running_state() {
        let mut tracker = tracker_with(Scene::attentive(), inline_config());
        let frame = Frame::blank(640, 480);
        assert!(tracker.process_frame(&frame).is_err());

        tracker.start().unwrap();
        assert!(tracker.process_frame(&frame).is_ok());

        tracker.stop();
        assert!(tracker.process_frame(&frame).is_err());
        assert!(tracker.start().is_err());
    }

    #[test]
    fn attentive_frames_are_focused() {
        let mut tracker = tracker_with(Scene::attentive(), inline_config());
        tracker.start().unwrap();
        let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
        assert!(metrics.face_visible);
        assert!(metrics.orientation_good);
        assert!(metrics.focused);
        assert!((metrics.focus_score - 1.0).abs() < 1e-9);
        assert!((metrics.ear - 0.30).abs() < 1e-6);
    }

    #[test]
    fn fps_uses_a_bounded_window() {
        let mut counter = FpsCounter::default();
        let t0 = Instant::now();
        assert_eq!(counter.tick(t0), 0.0);
        for i in 1..30u64 {
            counter.tick(t0 + std::time::Duration::from_millis(i * 100));
        }
        assert!(counter.history.len() <= FPS_WINDOW);
        let fps = counter.tick(t0 + std::time::Duration::from_millis(3000));
        assert!((fps - 10.0).abs() < 0.5, "fps {fps}");
    }

    #[test]
    fn skipped_frames_reuse_the_cached_detection() {
        use crate::detect::{ObjectLabel, PhoneDetection};
        use crate::BoundingBox;

        let mut config = inline_config();
        config.detection.frame_skip = 3;
        let provider = SyntheticLandmarkProvider::default();
        let mut detector = StubPhoneDetector::new(DetectionSettings::default());
        // First detector invocation sees a phone over the face; later ones
        // see nothing.
        detector.push_result(vec![PhoneDetection {
            bbox: BoundingBox::new(200.0, 100.0, 500.0, 400.0),
            confidence: 0.9,
            label: ObjectLabel::CellPhone,
        }]);
        let mut tracker =
            FocusTracker::with_backends(config, Box::new(provider), Box::new(detector));
        tracker.start().unwrap();

        let frame = Frame::blank(640, 480);
        let mut near = Vec::new();
        for _ in 0..6 {
            near.push(tracker.process_frame(&frame).unwrap().phone_near_face);
        }
        // Detector runs on frames 3 and 6; frames 4-5 reuse the stale hit.
        assert_eq!(near, vec![false, false, true, true, true, false]);
    }

    #[test]
    fn metrics_serialize_with_wire_field_names() {
        let mut tracker = tracker_with(Scene::attentive(), inline_config());
        tracker.start().unwrap();
        let metrics = tracker.process_frame(&Frame::blank(640, 480)).unwrap();
        let json = serde_json::to_value(&metrics).unwrap();
        for field in [
            "focused",
            "focus_score",
            "face_visible",
            "orientation_good",
            "yaw",
            "pitch",
            "roll",
            "head_tilt",
            "ear",
            "mar",
            "eye_closed",
            "yawning",
            "phone_near_face",
            "hand_near_face",
            "phone_confidence",
            "posture_stable",
            "status_messages",
            "fps",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["status_messages"]["overall"]["text"], "Focused and stable");
    }
}
