use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use blinkwatch_core::{
    Clock, EyeEvent, EyeEventSink, EyeStateSampler, LandmarkSource, Liveness, Millis, Thresholds,
};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn sampler thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("sampler thread exited")]
    ChannelClosed,
}

/// Timing parameters for the sampler thread.
#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Delay before the first tick, letting the provider settle.
    pub warmup: Duration,
    /// Time between ticks.
    pub frame_interval: Duration,
    pub thresholds: Thresholds,
}

/// Point-in-time view of the sampler, answered from the sampler thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SamplerStatus {
    /// Warm-up is over and ticks are running.
    pub sampling: bool,
    /// Ticks run, with or without landmarks.
    pub polls: u64,
    /// Ticks that carried landmarks.
    pub measured: u64,
    pub blinks: u64,
    pub prolonged_open: u64,
    pub last_blink_ms: Option<Millis>,
    pub last_eye_close_ms: Millis,
}

/// Messages sent to the sampler thread.
enum EngineRequest {
    Status {
        reply: oneshot::Sender<SamplerStatus>,
    },
}

/// Clone-safe handle for querying the sampler thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Snapshot the sampler's counters and eye state.
    pub async fn status(&self) -> Result<SamplerStatus, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Status { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }
}

/// Owner of the sampler thread. Dropping it stops the thread.
pub struct Engine {
    handle: EngineHandle,
    liveness: Liveness,
    thread: Option<JoinHandle<()>>,
}

impl Engine {
    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop ticking and wait for the thread to exit.
    ///
    /// Once this returns no tick is pending and no event will be emitted.
    pub fn stop(&mut self) {
        self.liveness.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("sampler thread panicked");
            }
            tracing::info!("sampler stopped");
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Spawn the sampler on a dedicated OS thread.
///
/// The eye-open window starts now; ticks begin after `settings.warmup` and
/// repeat every `settings.frame_interval`. Sampler state never leaves the
/// thread: status queries are answered between ticks.
pub fn spawn_engine(
    source: Arc<dyn LandmarkSource>,
    clock: Arc<dyn Clock>,
    mut sink: Box<dyn EyeEventSink>,
    settings: EngineSettings,
) -> Result<Engine, EngineError> {
    let liveness = Liveness::new();
    let thread_liveness = liveness.clone();
    let (tx, mut rx) = mpsc::channel::<EngineRequest>(4);

    let thread = std::thread::Builder::new()
        .name("blinkwatch-sampler".into())
        .spawn(move || {
            let liveness = thread_liveness;
            let start = clock.now_ms();
            let sampling_from = start.saturating_add(settings.warmup.as_millis() as Millis);
            let mut sampler = EyeStateSampler::new(start, settings.thresholds, liveness.clone());
            let mut status = SamplerStatus {
                last_eye_close_ms: start,
                ..SamplerStatus::default()
            };

            tracing::info!(
                warmup_ms = settings.warmup.as_millis() as u64,
                frame_interval_ms = settings.frame_interval.as_millis() as u64,
                "sampler thread started"
            );

            while liveness.is_alive() {
                while let Ok(req) = rx.try_recv() {
                    match req {
                        EngineRequest::Status { reply } => {
                            let _ = reply.send(status.clone());
                        }
                    }
                }

                let now = clock.now_ms();
                if now >= sampling_from {
                    if !status.sampling {
                        status.sampling = true;
                        tracing::info!(now_ms = now, "warm-up complete, sampling eye state");
                    }

                    let landmarks = source.landmarks();
                    let outcome = sampler.tick(landmarks.as_ref(), now);
                    status.polls += 1;

                    for event in &outcome.events {
                        if !liveness.is_alive() {
                            break;
                        }
                        match event {
                            EyeEvent::Blink { .. } => status.blinks += 1,
                            EyeEvent::ProlongedOpen { .. } => status.prolonged_open += 1,
                        }
                        sink.on_event(event);
                    }

                    let state = sampler.state();
                    status.measured = sampler.ticks();
                    status.last_blink_ms = state.last_blink;
                    status.last_eye_close_ms = state.last_eye_close;

                    if !outcome.reschedule {
                        break;
                    }
                }

                if !liveness.sleep(settings.frame_interval) {
                    break;
                }
            }

            tracing::info!(
                polls = status.polls,
                blinks = status.blinks,
                prolonged_open = status.prolonged_open,
                "sampler thread exiting"
            );
        })
        .map_err(EngineError::Spawn)?;

    Ok(Engine {
        handle: EngineHandle { tx },
        liveness,
        thread: Some(thread),
    })
}
