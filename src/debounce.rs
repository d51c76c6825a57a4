//! Temporal debouncers.
//!
//! Per-frame booleans coming out of the extractors are noisy: a single
//! blink frame or one spurious detector box must never flip the reported
//! state. The two debouncers here are the only place in the pipeline where
//! per-frame noise is smoothed into stable signals.

use std::time::{Duration, Instant};

/// Consecutive-frame counter for eye closure.
///
/// `eye_closed` is reported only after `consec_frames` consecutive frames
/// with EAR below the threshold, and resets as soon as EAR rises again. A
/// frame with an invalid EAR measurement (degenerate contour) leaves the
/// counter untouched.
#[derive(Clone, Debug)]
pub struct EyeClosureDebounce {
    threshold: f64,
    consec_frames: u32,
    counter: u32,
}

impl EyeClosureDebounce {
    pub fn new(threshold: f64, consec_frames: u32) -> Self {
        Self {
            threshold,
            consec_frames: consec_frames.max(1),
            counter: 0,
        }
    }

    /// Feed one frame's EAR measurement; returns the debounced closed state.
    pub fn update(&mut self, ear: Option<f64>) -> bool {
        match ear {
            Some(value) if value < self.threshold => self.counter += 1,
            Some(_) => self.counter = 0,
            // Measurement invalid this frame: skip the counter update.
            None => {}
        }
        self.counter >= self.consec_frames
    }

    pub fn consecutive_frames(&self) -> u32 {
        self.counter
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}

/// Streak-plus-cooldown debounce for phone detections.
///
/// An alert fires only after `streak_required` consecutive hit frames AND
/// once `cooldown` has elapsed since the previous alert. The streak resets
/// on a miss and on a fired alert; while the cooldown gate is shut the
/// streak keeps accumulating so a sustained detection alerts again as soon
/// as the window reopens.
#[derive(Clone, Debug)]
pub struct PhoneStreakDebounce {
    streak_required: u32,
    cooldown: Duration,
    streak: u32,
    last_trigger: Option<Instant>,
}

impl PhoneStreakDebounce {
    pub fn new(streak_required: u32, cooldown: Duration) -> Self {
        Self {
            streak_required: streak_required.max(1),
            cooldown,
            streak: 0,
            last_trigger: None,
        }
    }

    /// Feed one frame's hit/miss; returns true when an alert fires.
    pub fn update(&mut self, hit: bool, now: Instant) -> bool {
        if hit {
            self.streak += 1;
        } else {
            self.streak = 0;
        }

        if self.streak >= self.streak_required {
            let cooled_down = match self.last_trigger {
                None => true,
                Some(previous) => now.duration_since(previous) > self.cooldown,
            };
            if cooled_down {
                self.last_trigger = Some(now);
                self.streak = 0;
                return true;
            }
        }
        false
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn reset(&mut self) {
        self.streak = 0;
        self.last_trigger = None;
    }
}
