use anyhow::{anyhow, Result};

use crate::frame::Frame;

use super::{FaceLandmarks, HandLandmarks, PoseLandmarks};

/// Everything a landmark backend reports for one frame: zero-or-one face,
/// zero-to-two hands, zero-or-one body pose.
#[derive(Clone, Debug, Default)]
pub struct FrameLandmarks {
    pub face: Option<FaceLandmarks>,
    pub hands: Vec<HandLandmarks>,
    pub pose: Option<PoseLandmarks>,
}

/// Landmark provider backend.
///
/// Implementations wrap an external landmark model (face mesh, hand
/// skeleton, body pose). The provider is resolved once at startup from
/// configuration; the hot path never branches between backends.
///
/// Implementations must treat the pixel data as read-only and ephemeral and
/// report coordinates in image pixels (pose landmarks stay normalized, as
/// pose models emit them).
pub trait LandmarkProvider: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Detect landmarks on a frame. An empty `FrameLandmarks` (no face, no
    /// hands) is a valid result, not an error.
    fn detect(&mut self, frame: &Frame) -> Result<FrameLandmarks>;
}

/// Resolve a provider backend by configured name.
///
/// Real model backends (face mesh runtimes etc.) register here when the
/// crate is embedded; the built-in `synthetic` backend serves tests and the
/// demo daemon.
pub fn resolve_provider(backend: &str) -> Result<Box<dyn LandmarkProvider>> {
    match backend {
        "synthetic" => Ok(Box::new(super::SyntheticLandmarkProvider::default())),
        other => Err(anyhow!("unknown landmark backend '{}'", other)),
    }
}
