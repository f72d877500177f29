//! Gaze marker, tracker status text and event notifications.

use std::fmt;

use blinkwatch_core::{EyeEvent, EyeEventSink, GazePoint};

/// Tracker readiness as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStatus {
    Initializing,
    Ready,
    Unavailable,
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Initializing => "Initializing eye tracker...",
            Self::Ready => "Eye tracker running",
            Self::Unavailable => "Eye tracking unavailable",
        })
    }
}

/// The on-screen gaze dot.
///
/// Hidden until the first estimate; a frame without an estimate leaves it
/// where it was.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GazeMarker {
    position: Option<GazePoint>,
    moves: u64,
}

impl GazeMarker {
    pub fn apply(&mut self, gaze: Option<GazePoint>) {
        let Some(point) = gaze else {
            return;
        };
        if self.position.is_none() {
            tracing::debug!(x = point.x, y = point.y, "gaze marker shown");
        }
        self.position = Some(point);
        self.moves += 1;
        tracing::trace!(x = point.x, y = point.y, "gaze marker moved");
    }

    pub fn is_visible(&self) -> bool {
        self.position.is_some()
    }

    pub fn position(&self) -> Option<GazePoint> {
        self.position
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }
}

/// Logs detector events.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl EyeEventSink for LogNotifier {
    fn on_event(&mut self, event: &EyeEvent) {
        match event {
            EyeEvent::Blink { at } => tracing::info!(at_ms = *at, "blink detected"),
            EyeEvent::ProlongedOpen { at } => {
                tracing::info!(at_ms = *at, "eyes have been open too long")
            }
        }
    }
}
