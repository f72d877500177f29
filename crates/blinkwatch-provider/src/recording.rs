//! Landmark recording format (JSON Lines).
//!
//! One frame per line:
//!
//! ```text
//! {"t_ms": 0, "gaze": {"x": 640.0, "y": 360.0}, "landmarks": [[x, y], ...]}
//! ```
//!
//! `t_ms` is relative to the start of the recording and must not decrease.
//! `gaze` and `landmarks` may be `null` or omitted. Blank lines are skipped.

use std::io::BufRead;
use std::path::Path;

use blinkwatch_core::{GazePoint, LandmarkSet, Millis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to read recording {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read line {line}: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: timestamp {t_ms} is earlier than the previous frame ({previous})")]
    NonMonotonic { line: usize, t_ms: Millis, previous: Millis },
}

/// One recorded tracker frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    pub t_ms: Millis,
    #[serde(default)]
    pub gaze: Option<GazePoint>,
    #[serde(default)]
    pub landmarks: Option<LandmarkSet>,
}

/// A validated, time-ordered sequence of frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recording {
    pub frames: Vec<RecordedFrame>,
}

impl Recording {
    /// Load and validate a recording from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RecordingError> {
        let path = path.as_ref();
        let io_err = |source| RecordingError::Io {
            path: path.display().to_string(),
            source,
        };
        let file = std::fs::File::open(path).map_err(io_err)?;
        let recording = Self::parse(std::io::BufReader::new(file)).map_err(|err| match err {
            RecordingError::ReadLine { source, .. } => io_err(source),
            other => other,
        })?;

        tracing::debug!(
            path = %path.display(),
            frames = recording.frames.len(),
            duration_ms = recording.duration_ms(),
            "loaded recording"
        );
        Ok(recording)
    }

    /// Parse JSON Lines from a reader.
    pub fn parse(reader: impl BufRead) -> Result<Self, RecordingError> {
        let mut frames: Vec<RecordedFrame> = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line =
                line.map_err(|source| RecordingError::ReadLine { line: line_no, source })?;
            if line.trim().is_empty() {
                continue;
            }

            let frame: RecordedFrame = serde_json::from_str(&line)
                .map_err(|source| RecordingError::Parse { line: line_no, source })?;

            if let Some(prev) = frames.last() {
                if frame.t_ms < prev.t_ms {
                    return Err(RecordingError::NonMonotonic {
                        line: line_no,
                        t_ms: frame.t_ms,
                        previous: prev.t_ms,
                    });
                }
            }
            frames.push(frame);
        }

        Ok(Self { frames })
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Timestamp of the last frame.
    pub fn duration_ms(&self) -> Millis {
        self.frames.last().map_or(0, |f| f.t_ms)
    }

    pub fn frames_with_landmarks(&self) -> usize {
        self.frames.iter().filter(|f| f.landmarks.is_some()).count()
    }

    pub fn frames_with_gaze(&self) -> usize {
        self.frames.iter().filter(|f| f.gaze.is_some()).count()
    }

    /// `(t_ms, landmarks)` pairs for offline analysis.
    pub fn landmark_timeline(&self) -> impl Iterator<Item = (Millis, Option<LandmarkSet>)> + '_ {
        self.frames.iter().map(|f| (f.t_ms, f.landmarks.clone()))
    }
}
