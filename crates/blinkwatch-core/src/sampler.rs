//! Per-tick eye-state sampling.
//!
//! [`EyeStateSampler::tick`] is one step of the frame loop: pull the current
//! landmarks, update the detector, report whether another tick should be
//! scheduled. The loop itself (cadence, warm-up, threading) lives with the
//! host; the sampler only needs a [`Liveness`] flag to honor teardown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::detector::{EyeState, EyeStateDetector, Thresholds};
use crate::ear::EyeMeasurement;
use crate::types::{EyeEvent, LandmarkSet, Millis};

/// Longest single sleep inside [`Liveness::sleep`], bounding stop latency.
const LIVENESS_POLL: Duration = Duration::from_millis(10);

/// Shared "still running" flag between a loop and its owner.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Lower the flag. Idempotent.
    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Sleep for `duration`, waking early if stopped.
    ///
    /// Returns whether the flag is still up afterwards.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while self.is_alive() {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(LIVENESS_POLL));
        }
        false
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Millisecond time source for the sampler.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> Millis;
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Receiver of detector events.
pub trait EyeEventSink: Send {
    fn on_event(&mut self, event: &EyeEvent);
}

/// Result of one sampler tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickOutcome {
    pub events: Vec<EyeEvent>,
    /// Whether the host should schedule another tick.
    pub reschedule: bool,
}

impl TickOutcome {
    fn stopped() -> Self {
        Self { events: Vec::new(), reschedule: false }
    }

    fn idle() -> Self {
        Self { events: Vec::new(), reschedule: true }
    }
}

/// Detector plus liveness guard, driven one tick at a time.
#[derive(Debug)]
pub struct EyeStateSampler {
    detector: EyeStateDetector,
    liveness: Liveness,
    ticks: u64,
}

impl EyeStateSampler {
    /// Start sampling at `start`; the eye-open window begins then.
    pub fn new(start: Millis, thresholds: Thresholds, liveness: Liveness) -> Self {
        Self {
            detector: EyeStateDetector::new(start, thresholds),
            liveness,
            ticks: 0,
        }
    }

    pub fn state(&self) -> EyeState {
        self.detector.state()
    }

    /// Ticks that reached the detector.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Run one tick with the landmarks available at `now`.
    ///
    /// A stopped sampler mutates nothing and asks not to be rescheduled.
    /// Missing landmarks leave the state untouched.
    pub fn tick(&mut self, landmarks: Option<&LandmarkSet>, now: Millis) -> TickOutcome {
        if !self.liveness.is_alive() {
            return TickOutcome::stopped();
        }

        let Some(landmarks) = landmarks else {
            return TickOutcome::idle();
        };

        let measurement = EyeMeasurement::from_landmarks(landmarks);
        tracing::trace!(
            left = measurement.left,
            right = measurement.right,
            average = measurement.average,
            "eye measurement"
        );

        self.ticks += 1;
        TickOutcome {
            events: self.detector.update(&measurement, now),
            reschedule: true,
        }
    }
}
