//! Layered tracker configuration.
//!
//! Defaults are overridden by an optional JSON config file (path in
//! `FOCUS_CONFIG`), then by individual environment variables, then
//! validated. The many near-identical threshold sets of historical tracker
//! variants collapse into this one struct: a profile selects strict or
//! lenient orientation limits, and every knob has exactly one home.

use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::detect::DetectionSettings;
use crate::frame::SourceConfig;
use crate::fusion::{FocusWeights, OrientationLimits};

const DEFAULT_SOURCE_URI: &str = "stub://webcam";
const DEFAULT_SOURCE_FPS: u32 = 15;
const DEFAULT_FRAME_WIDTH: u32 = 640;
const DEFAULT_FRAME_HEIGHT: u32 = 480;
const DEFAULT_LANDMARK_BACKEND: &str = "synthetic";
const DEFAULT_DETECTOR_BACKEND: &str = "stub";

const DEFAULT_FRAME_SKIP: u32 = 2;
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.4;
const DEFAULT_MIN_BOX_AREA_RATIO: f64 = 0.01;
const DEFAULT_STREAK_REQUIRED: u32 = 15;
const DEFAULT_COOLDOWN_SECS: f64 = 3.0;
const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.1;

const DEFAULT_EYE_AR_THRESHOLD: f64 = 0.20;
const DEFAULT_EYE_AR_CONSEC_FRAMES: u32 = 3;
const DEFAULT_MOUTH_AR_THRESHOLD: f64 = 0.88;
const DEFAULT_FOCUS_THRESHOLD: f64 = 0.7;
const DEFAULT_POSTURE_THRESHOLD: f64 = 0.3;
const DEFAULT_HAND_MARGIN_FRACTION: f64 = 0.2;

#[derive(Debug, Deserialize, Default)]
struct TrackerConfigFile {
    source: Option<SourceConfigFile>,
    landmark_backend: Option<String>,
    detector_backend: Option<String>,
    detection: Option<DetectionConfigFile>,
    thresholds: Option<ThresholdConfigFile>,
    orientation_profile: Option<OrientationProfile>,
    weights: Option<FocusWeights>,
}

#[derive(Debug, Deserialize, Default)]
struct SourceConfigFile {
    uri: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectionConfigFile {
    frame_skip: Option<u32>,
    background: Option<bool>,
    confidence_threshold: Option<f64>,
    min_box_area_ratio: Option<f64>,
    streak_required: Option<u32>,
    cooldown_secs: Option<f64>,
    overlap_threshold: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
struct ThresholdConfigFile {
    eye_ar: Option<f64>,
    eye_ar_consec_frames: Option<u32>,
    mouth_ar: Option<f64>,
    focus_score: Option<f64>,
    posture: Option<f64>,
    hand_margin_fraction: Option<f64>,
}

/// Orientation threshold profile. One profile per evaluation; strict and
/// lenient limits are never mixed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrientationProfile {
    /// 15 deg yaw / 15 deg pitch / 15 deg tilt.
    #[default]
    Strict,
    /// 30 deg yaw / 30 deg pitch / 45 deg tilt.
    Lenient,
}

impl OrientationProfile {
    pub fn limits(&self) -> OrientationLimits {
        match self {
            OrientationProfile::Strict => OrientationLimits {
                yaw: 15.0,
                pitch: 15.0,
                tilt: 15.0,
            },
            OrientationProfile::Lenient => OrientationLimits {
                yaw: 30.0,
                pitch: 30.0,
                tilt: 45.0,
            },
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "strict" => Ok(OrientationProfile::Strict),
            "lenient" => Ok(OrientationProfile::Lenient),
            other => Err(anyhow!("unknown orientation profile '{}'", other)),
        }
    }
}

/// Object-detection knobs.
#[derive(Clone, Copy, Debug)]
pub struct DetectionConfig {
    /// Run the detector only every Kth frame; cached results cover the rest.
    pub frame_skip: u32,
    /// Detect on a background worker thread (false = inline, deterministic).
    pub background: bool,
    pub confidence_threshold: f64,
    pub min_box_area_ratio: f64,
    /// Consecutive hit frames required before a phone alert fires.
    pub streak_required: u32,
    /// Minimum seconds between fired phone alerts.
    pub cooldown_secs: f64,
    /// Face-overlap ratio above which a phone counts as near the face.
    pub overlap_threshold: f64,
}

/// Scoring and debounce thresholds.
#[derive(Clone, Copy, Debug)]
pub struct ThresholdConfig {
    pub eye_ar: f64,
    pub eye_ar_consec_frames: u32,
    pub mouth_ar: f64,
    pub focus_score: f64,
    pub posture: f64,
    pub hand_margin_fraction: f64,
}

/// Complete tracker configuration.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    pub source: SourceConfig,
    pub landmark_backend: String,
    pub detector_backend: String,
    pub detection: DetectionConfig,
    pub thresholds: ThresholdConfig,
    pub orientation_profile: OrientationProfile,
    pub weights: FocusWeights,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig {
                uri: DEFAULT_SOURCE_URI.to_string(),
                target_fps: DEFAULT_SOURCE_FPS,
                width: DEFAULT_FRAME_WIDTH,
                height: DEFAULT_FRAME_HEIGHT,
            },
            landmark_backend: DEFAULT_LANDMARK_BACKEND.to_string(),
            detector_backend: DEFAULT_DETECTOR_BACKEND.to_string(),
            detection: DetectionConfig {
                frame_skip: DEFAULT_FRAME_SKIP,
                background: true,
                confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
                min_box_area_ratio: DEFAULT_MIN_BOX_AREA_RATIO,
                streak_required: DEFAULT_STREAK_REQUIRED,
                cooldown_secs: DEFAULT_COOLDOWN_SECS,
                overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            },
            thresholds: ThresholdConfig {
                eye_ar: DEFAULT_EYE_AR_THRESHOLD,
                eye_ar_consec_frames: DEFAULT_EYE_AR_CONSEC_FRAMES,
                mouth_ar: DEFAULT_MOUTH_AR_THRESHOLD,
                focus_score: DEFAULT_FOCUS_THRESHOLD,
                posture: DEFAULT_POSTURE_THRESHOLD,
                hand_margin_fraction: DEFAULT_HAND_MARGIN_FRACTION,
            },
            orientation_profile: OrientationProfile::default(),
            weights: FocusWeights::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration: defaults, then the `FOCUS_CONFIG` file if set,
    /// then environment overrides, then validation.
    pub fn load() -> Result<Self> {
        let file_cfg = match std::env::var("FOCUS_CONFIG").ok().as_deref() {
            Some(path) => read_config_file(Path::new(path))?,
            None => TrackerConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg);
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: TrackerConfigFile) -> Self {
        let mut cfg = Self::default();
        if let Some(source) = file.source {
            if let Some(uri) = source.uri {
                cfg.source.uri = uri;
            }
            if let Some(fps) = source.target_fps {
                cfg.source.target_fps = fps;
            }
            if let Some(width) = source.width {
                cfg.source.width = width;
            }
            if let Some(height) = source.height {
                cfg.source.height = height;
            }
        }
        if let Some(backend) = file.landmark_backend {
            cfg.landmark_backend = backend;
        }
        if let Some(backend) = file.detector_backend {
            cfg.detector_backend = backend;
        }
        if let Some(detection) = file.detection {
            let d = &mut cfg.detection;
            if let Some(v) = detection.frame_skip {
                d.frame_skip = v;
            }
            if let Some(v) = detection.background {
                d.background = v;
            }
            if let Some(v) = detection.confidence_threshold {
                d.confidence_threshold = v;
            }
            if let Some(v) = detection.min_box_area_ratio {
                d.min_box_area_ratio = v;
            }
            if let Some(v) = detection.streak_required {
                d.streak_required = v;
            }
            if let Some(v) = detection.cooldown_secs {
                d.cooldown_secs = v;
            }
            if let Some(v) = detection.overlap_threshold {
                d.overlap_threshold = v;
            }
        }
        if let Some(thresholds) = file.thresholds {
            let t = &mut cfg.thresholds;
            if let Some(v) = thresholds.eye_ar {
                t.eye_ar = v;
            }
            if let Some(v) = thresholds.eye_ar_consec_frames {
                t.eye_ar_consec_frames = v;
            }
            if let Some(v) = thresholds.mouth_ar {
                t.mouth_ar = v;
            }
            if let Some(v) = thresholds.focus_score {
                t.focus_score = v;
            }
            if let Some(v) = thresholds.posture {
                t.posture = v;
            }
            if let Some(v) = thresholds.hand_margin_fraction {
                t.hand_margin_fraction = v;
            }
        }
        if let Some(profile) = file.orientation_profile {
            cfg.orientation_profile = profile;
        }
        if let Some(weights) = file.weights {
            cfg.weights = weights;
        }
        cfg
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(uri) = std::env::var("FOCUS_SOURCE_URI") {
            if !uri.trim().is_empty() {
                self.source.uri = uri;
            }
        }
        if let Ok(backend) = std::env::var("FOCUS_LANDMARK_BACKEND") {
            if !backend.trim().is_empty() {
                self.landmark_backend = backend;
            }
        }
        if let Ok(backend) = std::env::var("FOCUS_DETECTOR_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector_backend = backend;
            }
        }
        if let Ok(skip) = std::env::var("FOCUS_FRAME_SKIP") {
            self.detection.frame_skip = skip
                .parse()
                .map_err(|_| anyhow!("FOCUS_FRAME_SKIP must be an integer"))?;
        }
        if let Ok(profile) = std::env::var("FOCUS_ORIENTATION_PROFILE") {
            if !profile.trim().is_empty() {
                self.orientation_profile = OrientationProfile::parse(&profile)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.detection.frame_skip == 0 {
            return Err(anyhow!("detection.frame_skip must be >= 1"));
        }
        if self.thresholds.eye_ar_consec_frames == 0 {
            return Err(anyhow!("thresholds.eye_ar_consec_frames must be >= 1"));
        }
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            return Err(anyhow!("detection.confidence_threshold must be in [0, 1]"));
        }
        if self.detection.cooldown_secs < 0.0 {
            return Err(anyhow!("detection.cooldown_secs must be >= 0"));
        }
        if !(0.0..1.0).contains(&self.thresholds.focus_score) {
            return Err(anyhow!("thresholds.focus_score must be in [0, 1)"));
        }
        let weight_sum = self.weights.sum();
        if (weight_sum - 1.0).abs() > 1e-6 {
            return Err(anyhow!(
                "focus weights must sum to 1.0 (got {})",
                weight_sum
            ));
        }
        Ok(())
    }

    pub fn detection_settings(&self) -> DetectionSettings {
        DetectionSettings {
            confidence_threshold: self.detection.confidence_threshold,
            min_box_area_ratio: self.detection.min_box_area_ratio,
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.detection.cooldown_secs)
    }

    pub fn orientation_limits(&self) -> OrientationLimits {
        self.orientation_profile.limits()
    }
}

fn read_config_file(path: &Path) -> Result<TrackerConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        TrackerConfig::default().validate().unwrap();
    }

    #[test]
    fn skewed_weights_are_rejected() {
        let mut cfg = TrackerConfig::default();
        cfg.weights.posture = 0.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_frame_skip_is_rejected() {
        let mut cfg = TrackerConfig::default();
        cfg.detection.frame_skip = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn profiles_expose_their_limits() {
        let strict = OrientationProfile::Strict.limits();
        assert_eq!((strict.yaw, strict.pitch, strict.tilt), (15.0, 15.0, 15.0));
        let lenient = OrientationProfile::Lenient.limits();
        assert_eq!(
            (lenient.yaw, lenient.pitch, lenient.tilt),
            (30.0, 30.0, 45.0)
        );
        assert_eq!(
            OrientationProfile::parse("LENIENT").unwrap(),
            OrientationProfile::Lenient
        );
        assert!(OrientationProfile::parse("loose").is_err());
    }
}
