use serde::{Deserialize, Serialize};

/// Milliseconds on a monotonic timeline.
pub type Millis = u64;

/// A 2D landmark position in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Ordered facial landmarks for one frame (68-point scheme).
///
/// Serialized as a plain array of `[x, y]` pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LandmarkSet {
    pub points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Slice `start..start + len`, clamped to the available points.
    ///
    /// A short set yields a short (possibly empty) slice rather than panicking.
    pub fn clamped_slice(&self, start: usize, len: usize) -> &[Point] {
        let begin = start.min(self.points.len());
        let end = start.saturating_add(len).min(self.points.len());
        &self.points[begin..end]
    }
}

/// Estimated on-screen gaze position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazePoint {
    pub x: f64,
    pub y: f64,
}

/// Observable output of the eye-state detector.
///
/// `at` is the tick timestamp that triggered the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EyeEvent {
    /// A closed-eye frame outside the blink debounce window.
    Blink { at: Millis },
    /// No closed-eye frame for longer than the eye-open threshold.
    ProlongedOpen { at: Millis },
}

impl EyeEvent {
    pub fn at(&self) -> Millis {
        match self {
            Self::Blink { at } | Self::ProlongedOpen { at } => *at,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blink { .. } => "blink",
            Self::ProlongedOpen { .. } => "prolonged_open",
        }
    }
}
