//! Pixel frames and frame sources.
//!
//! The tracker consumes frames from a `FrameSource`; real camera capture
//! (V4L2, RTSP, browser streams) lives outside this crate. The built-in
//! synthetic source answers `stub://` URIs and feeds tests and the demo
//! daemon.
//!
//! Sources are responsible for decoding and rate control; frames they hand
//! over are owned by the caller and dropped after processing. Frames are
//! never buffered, reordered or replayed.

use anyhow::{bail, Result};
use rand::Rng;

/// One captured frame: tightly packed RGB pixels plus dimensions.
#[derive(Clone, Debug)]
pub struct Frame {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture sequence number, monotonically increasing per source.
    pub seq: u64,
}

impl Frame {
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, seq: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            seq,
        }
    }

    /// All-black frame, mostly useful in tests.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(vec![0u8; (width * height * 3) as usize], width, height, 0)
    }
}

/// Configuration for a frame source.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Source URI; `stub://<name>` selects the synthetic source.
    pub uri: String,
    /// Target frame rate (frames per second).
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: "stub://webcam".to_string(),
            target_fps: 15,
            width: 640,
            height: 480,
        }
    }
}

/// Frame source trait.
///
/// `connect` performs the actual device/stream open; failure there is fatal
/// at startup, not recoverable mid-session.
pub trait FrameSource: Send {
    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()>;

    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Frames captured so far.
    fn frames_captured(&self) -> u64;
}

/// Open a frame source for a configured URI.
///
/// Only the synthetic `stub://` scheme is built in; camera backends are
/// external collaborators and register their own schemes when embedding the
/// crate.
pub fn open_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    if config.uri.starts_with("stub://") {
        Ok(Box::new(SyntheticSource::new(config.clone())))
    } else {
        bail!("cannot open frame source '{}'", config.uri)
    }
}

/// Synthetic frame source for tests and the demo daemon.
///
/// Produces noise frames at the configured size; the pixel content only
/// matters to backends that actually look at pixels, which the stub
/// landmark/detector backends do not.
pub struct SyntheticSource {
    config: SourceConfig,
    frame_count: u64,
    connected: bool,
}

impl SyntheticSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            connected: false,
        }
    }
}

impl FrameSource for SyntheticSource {
    fn connect(&mut self) -> Result<()> {
        self.connected = true;
        log::info!("frame source connected: {} (synthetic)", self.config.uri);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if !self.connected {
            bail!("frame source not connected");
        }
        self.frame_count += 1;

        let pixel_count = (self.config.width * self.config.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        // Sensor-ish noise so consecutive frames are never identical.
        let mut rng = rand::thread_rng();
        for pixel in pixels.iter_mut() {
            *pixel = rng.gen();
        }

        Ok(Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        ))
    }

    fn frames_captured(&self) -> u64 {
        self.frame_count
    }
}
