//! Boundary with the external gaze provider.
//!
//! The provider owns capture, face tracking and gaze estimation. blinkwatch
//! only consumes its per-frame gaze callback and its latest landmarks.

use std::sync::Arc;
use thiserror::Error;

use crate::types::{GazePoint, LandmarkSet};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider failed to start: {0}")]
    StartFailed(String),
    #[error("provider failed to stop: {0}")]
    StopFailed(String),
    #[error("provider already started")]
    AlreadyStarted,
}

/// Per-frame gaze callback. `None` means the provider had no estimate.
pub type GazeListener = Box<dyn FnMut(Option<GazePoint>) + Send + 'static>;

/// Read access to the provider's most recent landmarks.
pub trait LandmarkSource: Send + Sync {
    /// Current landmark set, or `None` when no face is tracked.
    fn landmarks(&self) -> Option<LandmarkSet>;
}

/// A gaze-estimation backend.
pub trait GazeProvider {
    /// Register the gaze callback. Call before [`start`](Self::start).
    fn set_gaze_listener(&mut self, listener: GazeListener);

    /// Bring up capture and tracking.
    fn start(&mut self) -> Result<(), ProviderError>;

    /// Release capture and tracking. Only valid after a successful start.
    fn stop(&mut self) -> Result<(), ProviderError>;

    /// Shared handle the sampler polls for landmarks.
    fn landmark_source(&self) -> Arc<dyn LandmarkSource>;
}
