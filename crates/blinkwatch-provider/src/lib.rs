//! blinkwatch-provider — Gaze providers behind the `GazeProvider` boundary.
//!
//! Landmark recordings are JSON Lines files of timestamped frames; the
//! replay provider plays them back in real time as if a tracker were
//! producing them.

pub mod feed;
pub mod recording;
pub mod replay;

pub use feed::LandmarkFeed;
pub use recording::{RecordedFrame, Recording, RecordingError};
pub use replay::ReplayProvider;
