//! Debounced blink and prolonged-open detection.
//!
//! Two detectors share one [`EyeState`]:
//! - blink: fires on a closed frame unless the previous accepted blink is
//!   within the debounce window;
//! - prolonged-open: fires when no closed frame was seen for longer than
//!   the eye-open threshold, then restarts its window at fire time. Eyes
//!   held open therefore re-fire once per window.

use crate::ear::EyeMeasurement;
use crate::types::{EyeEvent, Millis};

/// Average EAR below which a frame counts as eyes-closed.
pub const EAR_CLOSED_THRESHOLD: f64 = 0.2;

const DEFAULT_BLINK_DEBOUNCE_MS: Millis = 300;
const DEFAULT_EYE_OPEN_THRESHOLD_MS: Millis = 10_000;

/// Timing thresholds for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Minimum time between two accepted blinks.
    pub blink_debounce_ms: Millis,
    /// Time without a closed frame before a prolonged-open event.
    pub eye_open_threshold_ms: Millis,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            blink_debounce_ms: DEFAULT_BLINK_DEBOUNCE_MS,
            eye_open_threshold_ms: DEFAULT_EYE_OPEN_THRESHOLD_MS,
        }
    }
}

/// Mutable detector state carried across frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyeState {
    /// Most recently accepted blink, `None` until the first one.
    pub last_blink: Option<Millis>,
    /// Most recent closed frame (or prolonged-open reset).
    pub last_eye_close: Millis,
}

/// Blink / prolonged-open detector over per-frame EAR measurements.
#[derive(Debug, Clone)]
pub struct EyeStateDetector {
    thresholds: Thresholds,
    state: EyeState,
}

impl EyeStateDetector {
    /// Create a detector whose eye-open window starts at `start`.
    pub fn new(start: Millis, thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            state: EyeState {
                last_blink: None,
                last_eye_close: start,
            },
        }
    }

    pub fn state(&self) -> EyeState {
        self.state
    }

    /// Feed one frame's measurement taken at `now`.
    ///
    /// Returns the events this frame produced, in order: at most one blink
    /// followed by at most one prolonged-open.
    pub fn update(&mut self, measurement: &EyeMeasurement, now: Millis) -> Vec<EyeEvent> {
        let mut events = Vec::new();

        if measurement.average < EAR_CLOSED_THRESHOLD {
            let outside_window = match self.state.last_blink {
                None => true,
                Some(last) => now.saturating_sub(last) > self.thresholds.blink_debounce_ms,
            };
            if outside_window {
                self.state.last_blink = Some(now);
                events.push(EyeEvent::Blink { at: now });
            }
            // every closed frame refreshes the close time, debounced or not
            self.state.last_eye_close = self.state.last_eye_close.max(now);
        }

        if now.saturating_sub(self.state.last_eye_close) > self.thresholds.eye_open_threshold_ms {
            self.state.last_eye_close = now;
            events.push(EyeEvent::ProlongedOpen { at: now });
        }

        events
    }
}
