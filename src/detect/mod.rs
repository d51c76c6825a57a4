//! Phone/object detection subsystem.
//!
//! Real object-detector inference is an external collaborator; this module
//! defines the backend trait it plugs into, the detection result types, a
//! scripted stub backend, and the background worker that amortizes detector
//! cost across frames.

pub mod backend;
pub mod result;
pub mod stub;
pub mod worker;

pub use backend::{resolve_detector, DetectionSettings, PhoneDetectorBackend};
pub use result::{ObjectLabel, PhoneDetection};
pub use stub::StubPhoneDetector;
pub use worker::DetectionWorker;
