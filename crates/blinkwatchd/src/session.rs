use std::sync::{Arc, Mutex, MutexGuard};

use blinkwatch_core::{Clock, EyeEventSink, GazePoint, GazeProvider};

use crate::engine::{spawn_engine, Engine, EngineHandle, EngineSettings};
use crate::overlay::{GazeMarker, TrackerStatus};

/// A mounted gaze overlay: provider, marker and sampler wired together.
///
/// Mounting starts the provider once. The sampler only runs if that start
/// succeeded; a failed start leaves the session mounted but unavailable.
pub struct Session<P: GazeProvider> {
    provider: P,
    status: TrackerStatus,
    provider_started: bool,
    engine: Option<Engine>,
    marker: Arc<Mutex<GazeMarker>>,
}

impl<P: GazeProvider> Session<P> {
    pub fn mount(
        mut provider: P,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
        sink: Box<dyn EyeEventSink>,
    ) -> Self {
        let marker = Arc::new(Mutex::new(GazeMarker::default()));
        let listener_marker = marker.clone();
        provider.set_gaze_listener(Box::new(move |gaze: Option<GazePoint>| {
            lock(&listener_marker).apply(gaze)
        }));

        let mut session = Self {
            provider,
            status: TrackerStatus::Initializing,
            provider_started: false,
            engine: None,
            marker,
        };
        tracing::info!(status = %session.status, "session mounting");

        if let Err(err) = session.provider.start() {
            tracing::error!(error = %err, "gaze provider failed to start");
            session.set_status(TrackerStatus::Unavailable);
            return session;
        }
        session.provider_started = true;
        tracing::info!("gaze provider started");

        let source = session.provider.landmark_source();
        match spawn_engine(source, clock, sink, settings) {
            Ok(engine) => {
                session.engine = Some(engine);
                session.set_status(TrackerStatus::Ready);
            }
            Err(err) => {
                tracing::error!(error = %err, "sampler failed to start");
                session.set_status(TrackerStatus::Unavailable);
            }
        }
        session
    }

    pub fn status(&self) -> TrackerStatus {
        self.status
    }

    /// Whether the provider started successfully.
    pub fn is_ready(&self) -> bool {
        self.provider_started
    }

    /// Handle for sampler status queries, if the sampler is running.
    pub fn engine(&self) -> Option<EngineHandle> {
        self.engine.as_ref().map(Engine::handle)
    }

    pub fn marker(&self) -> GazeMarker {
        lock(&self.marker).clone()
    }

    /// Stop the sampler, then release the provider.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn set_status(&mut self, status: TrackerStatus) {
        self.status = status;
        tracing::info!(status = %status, "tracker status");
    }

    fn teardown(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
        }
        if self.provider_started {
            self.provider_started = false;
            if let Err(err) = self.provider.stop() {
                tracing::error!(error = %err, "error cleaning up gaze provider");
            } else {
                tracing::info!("gaze provider stopped");
            }
        }
    }
}

impl<P: GazeProvider> Drop for Session<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn lock(marker: &Mutex<GazeMarker>) -> MutexGuard<'_, GazeMarker> {
    marker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
