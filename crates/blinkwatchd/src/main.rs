use std::sync::Arc;

use anyhow::Result;
use blinkwatch_core::MonotonicClock;
use blinkwatch_provider::ReplayProvider;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod overlay;
mod session;

use config::Config;
use engine::EngineSettings;
use overlay::LogNotifier;
use session::Session;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("blinkwatchd starting");

    let config = Config::load()?;
    tracing::info!(
        recording = %config.recording_path.display(),
        looped = config.loop_recording,
        warmup_ms = config.warmup_ms,
        frame_interval_ms = config.frame_interval_ms,
        blink_debounce_ms = config.blink_debounce_ms,
        eye_open_threshold_ms = config.eye_open_threshold_ms,
        "configuration loaded"
    );

    let provider = ReplayProvider::new(&config.recording_path).looped(config.loop_recording);
    let settings = EngineSettings {
        warmup: config.warmup(),
        frame_interval: config.frame_interval(),
        thresholds: config.thresholds(),
    };
    let session = Session::mount(
        provider,
        settings,
        Arc::new(MonotonicClock::new()),
        Box::new(LogNotifier),
    );
    println!("{}", session.status());
    if !session.is_ready() {
        tracing::warn!("eye tracking unavailable; waiting for shutdown signal");
    }

    // Keep running until signaled, even when tracking is unavailable
    tokio::signal::ctrl_c().await?;
    tracing::info!("blinkwatchd shutting down");

    if let Some(engine) = session.engine() {
        match engine.status().await {
            Ok(status) => {
                let status = serde_json::to_string(&status)?;
                tracing::info!(%status, "final sampler status");
            }
            Err(err) => tracing::warn!(error = %err, "sampler status unavailable"),
        }
    }
    let marker = session.marker();
    tracing::info!(
        moves = marker.moves(),
        visible = marker.is_visible(),
        position = ?marker.position(),
        "gaze marker summary"
    );

    session.unmount();
    Ok(())
}
