//! Real-time playback of a landmark recording as a gaze provider.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use blinkwatch_core::{
    GazeListener, GazePoint, GazeProvider, LandmarkSource, Liveness, ProviderError,
};

use crate::feed::LandmarkFeed;
use crate::recording::{RecordedFrame, Recording};

/// Pause between passes when looping, so a zero-length recording cannot spin.
const LOOP_GAP: Duration = Duration::from_millis(16);

/// Provider that replays a recording file at its recorded pace.
///
/// `start` loads the file, so a missing or malformed recording surfaces as a
/// start failure. Frames are published to the landmark feed and passed to
/// the gaze listener from a dedicated `blinkwatch-replay` thread. The
/// listener slot is shared with that thread, so registering a listener
/// takes effect on the next frame, running or not.
pub struct ReplayProvider {
    path: PathBuf,
    looped: bool,
    feed: LandmarkFeed,
    listener: ListenerSlot,
    worker: Option<Worker>,
}

#[derive(Clone, Default)]
struct ListenerSlot(Arc<Mutex<Option<GazeListener>>>);

impl ListenerSlot {
    fn set(&self, listener: GazeListener) {
        *self.lock() = Some(listener);
    }

    fn notify(&self, gaze: Option<GazePoint>) {
        if let Some(on_gaze) = self.lock().as_mut() {
            on_gaze(gaze);
        }
    }

    // A panicking listener leaves the slot intact, so poison is ignored.
    fn lock(&self) -> MutexGuard<'_, Option<GazeListener>> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

struct Worker {
    liveness: Liveness,
    thread: JoinHandle<()>,
}

impl ReplayProvider {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            looped: false,
            feed: LandmarkFeed::new(),
            listener: ListenerSlot::default(),
            worker: None,
        }
    }

    /// Restart from the first frame after the last one instead of ending.
    pub fn looped(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl GazeProvider for ReplayProvider {
    fn set_gaze_listener(&mut self, listener: GazeListener) {
        self.listener.set(listener);
    }

    fn start(&mut self) -> Result<(), ProviderError> {
        if self.worker.is_some() {
            return Err(ProviderError::AlreadyStarted);
        }

        let recording =
            Recording::load(&self.path).map_err(|e| ProviderError::StartFailed(e.to_string()))?;
        if recording.is_empty() {
            return Err(ProviderError::StartFailed(format!(
                "recording {} has no frames",
                self.path.display()
            )));
        }

        tracing::info!(
            path = %self.path.display(),
            frames = recording.frames.len(),
            duration_ms = recording.duration_ms(),
            looped = self.looped,
            "replay provider starting"
        );

        let liveness = Liveness::new();
        let thread_liveness = liveness.clone();
        let feed = self.feed.clone();
        let listener = self.listener.clone();
        let looped = self.looped;
        let frames = recording.frames;

        let thread = std::thread::Builder::new()
            .name("blinkwatch-replay".into())
            .spawn(move || run_replay(&frames, looped, &feed, &listener, &thread_liveness))
            .map_err(|e| ProviderError::StartFailed(format!("failed to spawn replay thread: {e}")))?;

        self.worker = Some(Worker { liveness, thread });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), ProviderError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        worker.liveness.stop();
        let joined = worker.thread.join();
        self.feed.clear();

        match joined {
            Ok(()) => {
                tracing::info!(path = %self.path.display(), "replay provider stopped");
                Ok(())
            }
            Err(_) => Err(ProviderError::StopFailed("replay thread panicked".into())),
        }
    }

    fn landmark_source(&self) -> Arc<dyn LandmarkSource> {
        Arc::new(self.feed.clone())
    }
}

impl Drop for ReplayProvider {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            tracing::warn!(error = %err, "replay provider teardown failed");
        }
    }
}

/// Publish frames at their offsets until the end (or forever when looped).
fn run_replay(
    frames: &[RecordedFrame],
    looped: bool,
    feed: &LandmarkFeed,
    listener: &ListenerSlot,
    liveness: &Liveness,
) {
    tracing::debug!("replay thread started");

    'passes: loop {
        let origin = Instant::now();
        for frame in frames {
            let due = origin + Duration::from_millis(frame.t_ms);
            if !liveness.sleep(due.saturating_duration_since(Instant::now())) {
                break 'passes;
            }
            feed.publish(frame.landmarks.clone());
            listener.notify(frame.gaze);
        }

        if !looped || !liveness.sleep(LOOP_GAP) {
            break;
        }
        tracing::debug!("replay pass complete, looping");
    }

    // end of recording reads as face lost
    feed.clear();
    tracing::debug!("replay thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_recording(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn collecting_listener() -> (GazeListener, Arc<Mutex<Vec<Option<GazePoint>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: GazeListener = Box::new(move |gaze| sink.lock().unwrap().push(gaze));
        (listener, seen)
    }

    fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if cond() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        cond()
    }

    #[test]
    fn test_replays_all_frames_then_clears_feed() {
        let file = write_recording(&[
            r#"{"t_ms": 0, "gaze": {"x": 1.0, "y": 2.0}, "landmarks": [[0.0, 0.0]]}"#,
            r#"{"t_ms": 10, "gaze": null, "landmarks": [[1.0, 1.0]]}"#,
            r#"{"t_ms": 20, "gaze": {"x": 3.0, "y": 4.0}}"#,
        ]);
        let (listener, seen) = collecting_listener();

        let mut provider = ReplayProvider::new(file.path());
        provider.set_gaze_listener(listener);
        provider.start().unwrap();
        assert!(provider.is_running());

        assert!(wait_for(|| seen.lock().unwrap().len() == 3));
        let source = provider.landmark_source();
        assert!(wait_for(|| source.landmarks().is_none()));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                Some(GazePoint { x: 1.0, y: 2.0 }),
                None,
                Some(GazePoint { x: 3.0, y: 4.0 }),
            ]
        );

        provider.stop().unwrap();
        assert!(!provider.is_running());
        // idempotent
        provider.stop().unwrap();
    }

    #[test]
    fn test_missing_file_fails_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = ReplayProvider::new(dir.path().join("nope.jsonl"));
        let err = provider.start().unwrap_err();
        assert!(matches!(err, ProviderError::StartFailed(_)));
        assert!(!provider.is_running());
    }

    #[test]
    fn test_empty_recording_fails_start() {
        let file = write_recording(&[]);
        let mut provider = ReplayProvider::new(file.path());
        assert!(matches!(provider.start(), Err(ProviderError::StartFailed(_))));
    }

    #[test]
    fn test_double_start_rejected() {
        let file = write_recording(&[r#"{"t_ms": 0}"#, r#"{"t_ms": 60000}"#]);
        let mut provider = ReplayProvider::new(file.path());
        provider.start().unwrap();
        assert!(matches!(provider.start(), Err(ProviderError::AlreadyStarted)));
        provider.stop().unwrap();
    }

    #[test]
    fn test_looped_replay_stops_cleanly() {
        let file = write_recording(&[
            r#"{"t_ms": 0, "gaze": {"x": 0.0, "y": 0.0}}"#,
            r#"{"t_ms": 5, "gaze": {"x": 5.0, "y": 5.0}}"#,
        ]);
        let (listener, seen) = collecting_listener();

        let mut provider = ReplayProvider::new(file.path()).looped(true);
        provider.set_gaze_listener(listener);
        provider.start().unwrap();

        assert!(wait_for(|| seen.lock().unwrap().len() >= 4));
        provider.stop().unwrap();

        let after_stop = seen.lock().unwrap().len();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(seen.lock().unwrap().len(), after_stop);
    }

    #[test]
    fn test_listener_survives_restart() {
        let file = write_recording(&[r#"{"t_ms": 0, "gaze": {"x": 7.0, "y": 7.0}}"#]);
        let (listener, seen) = collecting_listener();

        let mut provider = ReplayProvider::new(file.path());
        provider.set_gaze_listener(listener);
        provider.start().unwrap();
        assert!(wait_for(|| seen.lock().unwrap().len() == 1));
        provider.stop().unwrap();

        provider.start().unwrap();
        assert!(wait_for(|| seen.lock().unwrap().len() == 2));
        provider.stop().unwrap();
    }

    #[test]
    fn test_listener_replaced_while_running() {
        let file = write_recording(&[
            r#"{"t_ms": 0, "gaze": {"x": 1.0, "y": 1.0}}"#,
            r#"{"t_ms": 5, "gaze": {"x": 2.0, "y": 2.0}}"#,
        ]);
        let (first, first_seen) = collecting_listener();
        let (second, second_seen) = collecting_listener();

        let mut provider = ReplayProvider::new(file.path()).looped(true);
        provider.set_gaze_listener(first);
        provider.start().unwrap();
        assert!(wait_for(|| !first_seen.lock().unwrap().is_empty()));

        provider.set_gaze_listener(second);
        let first_count = first_seen.lock().unwrap().len();
        assert!(wait_for(|| !second_seen.lock().unwrap().is_empty()));
        provider.stop().unwrap();

        let before_restart = second_seen.lock().unwrap().len();
        provider.start().unwrap();
        assert!(wait_for(|| second_seen.lock().unwrap().len() > before_restart));
        provider.stop().unwrap();

        assert_eq!(first_seen.lock().unwrap().len(), first_count);
    }

    #[test]
    fn test_listener_kept_after_failed_start() {
        let file = write_recording(&[]);
        let (listener, seen) = collecting_listener();

        let mut provider = ReplayProvider::new(file.path());
        provider.set_gaze_listener(listener);
        assert!(provider.start().is_err());

        std::fs::write(file.path(), "{\"t_ms\": 0, \"gaze\": {\"x\": 4.0, \"y\": 2.0}}\n").unwrap();
        provider.start().unwrap();
        assert!(wait_for(|| seen.lock().unwrap().len() == 1));
        provider.stop().unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Some(GazePoint { x: 4.0, y: 2.0 })]);
    }
}
