//! blinkwatch-core — Eye-state detection over facial landmarks.
//!
//! Computes the eye aspect ratio (EAR) from the 68-point landmark scheme
//! and runs a debounced blink / prolonged-open detector on top of it.
//! Landmarks and gaze points come from an external provider through the
//! traits in [`provider`].

pub mod analysis;
pub mod detector;
pub mod ear;
pub mod provider;
pub mod sampler;
pub mod types;

pub use detector::{EyeState, EyeStateDetector, Thresholds};
pub use provider::{GazeListener, GazeProvider, LandmarkSource, ProviderError};
pub use sampler::{Clock, EyeEventSink, EyeStateSampler, Liveness, MonotonicClock, TickOutcome};
pub use types::{EyeEvent, GazePoint, LandmarkSet, Millis, Point};
