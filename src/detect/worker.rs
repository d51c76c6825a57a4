//! Background detection worker.
//!
//! The object detector is the expensive stage of the pipeline, so it runs
//! off the frame thread. Only the newest result matters: the worker writes
//! into a single-slot, mutex-guarded cache that the frame thread reads every
//! frame, accepting a result that is one-to-several frames stale.
//!
//! At most one job is in flight at a time; a new job starts only after the
//! previous thread has finished, so threads never accumulate. Backend
//! errors and panics are caught and logged here and never reach the frame
//! loop.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crate::frame::Frame;
use crate::BoundingBox;

use super::backend::PhoneDetectorBackend;
use super::result::PhoneDetection;

pub struct DetectionWorker {
    backend: Arc<Mutex<Box<dyn PhoneDetectorBackend>>>,
    cache: Arc<Mutex<Vec<PhoneDetection>>>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    pub fn new(backend: Box<dyn PhoneDetectorBackend>) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
            cache: Arc::new(Mutex::new(Vec::new())),
            handle: None,
        }
    }

    /// True while a detection job is running.
    pub fn in_flight(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Launch a detection job for this frame unless one is already running.
    /// Returns true when a job was started.
    pub fn submit(&mut self, frame: Frame, roi: Option<BoundingBox>) -> bool {
        if self.in_flight() {
            return false;
        }
        self.reap_finished();

        let backend = Arc::clone(&self.backend);
        let cache = Arc::clone(&self.cache);
        self.handle = Some(std::thread::spawn(move || {
            let mut guard = match backend.lock() {
                Ok(guard) => guard,
                Err(_) => {
                    log::warn!("detection backend lock poisoned; skipping job");
                    return;
                }
            };
            match guard.detect(&frame, roi) {
                Ok(detections) => {
                    if let Ok(mut slot) = cache.lock() {
                        *slot = detections;
                    }
                }
                Err(e) => log::warn!("phone detection error: {}", e),
            }
        }));
        true
    }

    /// Snapshot of the most recent detection results (possibly stale).
    pub fn latest(&self) -> Vec<PhoneDetection> {
        self.cache
            .lock()
            .map(|slot| slot.clone())
            .unwrap_or_default()
    }

    /// Run detection synchronously on the caller's thread, bypassing the
    /// worker. Used when the tracker is configured without background
    /// detection.
    pub fn detect_blocking(&mut self, frame: &Frame, roi: Option<BoundingBox>) {
        let result = match self.backend.lock() {
            Ok(mut guard) => guard.detect(frame, roi),
            Err(_) => {
                log::warn!("detection backend lock poisoned; skipping detection");
                return;
            }
        };
        match result {
            Ok(detections) => {
                if let Ok(mut slot) = self.cache.lock() {
                    *slot = detections;
                }
            }
            Err(e) => log::warn!("phone detection error: {}", e),
        }
    }

    /// Wait for any in-flight job to finish. Called on tracker stop.
    pub fn join(&mut self) {
        self.reap_finished();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!("detection worker thread panicked");
            }
        }
    }

    fn reap_finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                if handle.join().is_err() {
                    log::warn!("detection worker thread panicked");
                }
            } else {
                self.handle = Some(handle);
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.join();
    }
}
