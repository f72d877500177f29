//! Latest-landmarks slot shared between a provider thread and the sampler.

use std::sync::{Arc, Mutex, MutexGuard};

use blinkwatch_core::{LandmarkSet, LandmarkSource};

/// Single-slot landmark feed. Writers replace, readers clone.
#[derive(Debug, Clone, Default)]
pub struct LandmarkFeed {
    slot: Arc<Mutex<Option<LandmarkSet>>>,
}

impl LandmarkFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the landmarks for the current frame (`None` = face lost).
    pub fn publish(&self, landmarks: Option<LandmarkSet>) {
        *self.lock() = landmarks;
    }

    pub fn clear(&self) {
        self.publish(None);
    }

    // A panicking writer leaves a whole value behind, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, Option<LandmarkSet>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LandmarkSource for LandmarkFeed {
    fn landmarks(&self) -> Option<LandmarkSet> {
        self.lock().clone()
    }
}
