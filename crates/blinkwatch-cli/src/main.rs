use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blinkwatch_core::analysis::analyze;
use blinkwatch_core::Thresholds;
use blinkwatch_provider::Recording;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "blinkwatch", about = "blinkwatch landmark recording tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run blink and eye-open detection over a recording
    Analyze {
        /// Landmark recording (JSON Lines)
        recording: PathBuf,
        /// Minimum milliseconds between two accepted blinks
        #[arg(long, default_value_t = Thresholds::default().blink_debounce_ms)]
        blink_debounce_ms: u64,
        /// Milliseconds without a closed-eye frame before an eye-open alert
        #[arg(long, default_value_t = Thresholds::default().eye_open_threshold_ms)]
        eye_open_threshold_ms: u64,
        /// Print the full analysis as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show frame counts and coverage of a recording
    Inspect {
        /// Landmark recording (JSON Lines)
        recording: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            recording,
            blink_debounce_ms,
            eye_open_threshold_ms,
            json,
        } => {
            let rec = load(&recording)?;
            let thresholds = Thresholds {
                blink_debounce_ms,
                eye_open_threshold_ms,
            };
            tracing::debug!(?thresholds, frames = rec.frames.len(), "analyzing recording");
            let analysis = analyze(rec.landmark_timeline(), thresholds);

            if json {
                println!("{}", serde_json::to_string_pretty(&analysis)?);
                return Ok(());
            }

            for event in &analysis.events {
                println!("{:>8} ms  {}", event.at(), event.as_str());
            }
            println!(
                "frames: {} ({} with face), duration: {} ms",
                analysis.frames, analysis.frames_with_face, analysis.duration_ms
            );
            println!(
                "blinks: {}, eye-open alerts: {}",
                analysis.blinks, analysis.prolonged_open
            );
            match analysis.ear {
                Some(ear) => println!(
                    "EAR min/mean/max: {:.3} / {:.3} / {:.3}",
                    ear.min, ear.mean, ear.max
                ),
                None => println!("EAR: no landmarks in recording"),
            }
        }
        Commands::Inspect { recording } => {
            let rec = load(&recording)?;
            println!("{}", recording.display());
            println!("  frames:          {}", rec.frames.len());
            println!("  duration:        {} ms", rec.duration_ms());
            println!("  with gaze:       {}", rec.frames_with_gaze());
            println!("  with landmarks:  {}", rec.frames_with_landmarks());
            let short = rec
                .frames
                .iter()
                .filter_map(|f| f.landmarks.as_ref())
                .filter(|l| l.len() < 48)
                .count();
            if short > 0 {
                println!("  short landmark sets (<48 points, eyes read as open): {short}");
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<Recording> {
    Recording::load(path).with_context(|| format!("loading {}", path.display()))
}
