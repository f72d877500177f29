//! Offline runs of the detector over timestamped frames.

use serde::Serialize;

use crate::detector::{EyeStateDetector, Thresholds};
use crate::ear::EyeMeasurement;
use crate::types::{EyeEvent, LandmarkSet, Millis};

/// Summary of an offline detector run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Analysis {
    pub events: Vec<EyeEvent>,
    pub frames: usize,
    pub frames_with_face: usize,
    pub blinks: usize,
    pub prolonged_open: usize,
    /// Span between first and last frame.
    pub duration_ms: Millis,
    pub ear: Option<EarStats>,
}

/// Average-EAR statistics over frames that carried landmarks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EarStats {
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Run the detector over `(timestamp, landmarks)` frames.
///
/// The first frame's timestamp is the sampler start. Frames without
/// landmarks count toward `frames` but never touch the detector.
pub fn analyze<I>(frames: I, thresholds: Thresholds) -> Analysis
where
    I: IntoIterator<Item = (Millis, Option<LandmarkSet>)>,
{
    let mut detector: Option<EyeStateDetector> = None;
    let mut analysis = Analysis::default();
    let mut first_ts: Option<Millis> = None;
    let mut last_ts: Millis = 0;
    let mut ear_sum = 0.0;
    let mut ear_min = f64::INFINITY;
    let mut ear_max = f64::NEG_INFINITY;

    for (ts, landmarks) in frames {
        analysis.frames += 1;
        first_ts.get_or_insert(ts);
        last_ts = last_ts.max(ts);

        let detector = detector.get_or_insert_with(|| EyeStateDetector::new(ts, thresholds));
        let Some(landmarks) = landmarks else {
            continue;
        };

        let measurement = EyeMeasurement::from_landmarks(&landmarks);
        analysis.frames_with_face += 1;
        ear_sum += measurement.average;
        ear_min = ear_min.min(measurement.average);
        ear_max = ear_max.max(measurement.average);

        analysis.events.extend(detector.update(&measurement, ts));
    }

    analysis.duration_ms = first_ts.map_or(0, |first| last_ts.saturating_sub(first));
    analysis.blinks = analysis
        .events
        .iter()
        .filter(|e| matches!(e, EyeEvent::Blink { .. }))
        .count();
    analysis.prolonged_open = analysis.events.len() - analysis.blinks;
    if analysis.frames_with_face > 0 {
        analysis.ear = Some(EarStats {
            min: ear_min,
            mean: ear_sum / analysis.frames_with_face as f64,
            max: ear_max,
        });
    }

    analysis
}
