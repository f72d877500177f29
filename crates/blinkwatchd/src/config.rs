use std::path::{Path, PathBuf};
use std::time::Duration;

use blinkwatch_core::Thresholds;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Daemon configuration.
///
/// Layered: built-in defaults, then an optional TOML file, then
/// `BLINKWATCH_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Landmark recording played back by the replay provider.
    pub recording_path: PathBuf,
    /// Restart the recording after its last frame.
    pub loop_recording: bool,
    /// Delay between provider start and the first sampler tick.
    pub warmup_ms: u64,
    /// Sampler cadence (one tick per display refresh at ~60 Hz).
    pub frame_interval_ms: u64,
    /// Minimum time between two accepted blinks.
    pub blink_debounce_ms: u64,
    /// Time without a closed-eye frame before "eyes open too long".
    pub eye_open_threshold_ms: u64,
}

/// TOML file layer; every key optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub recording_path: Option<PathBuf>,
    pub loop_recording: Option<bool>,
    pub warmup_ms: Option<u64>,
    pub frame_interval_ms: Option<u64>,
    pub blink_debounce_ms: Option<u64>,
    pub eye_open_threshold_ms: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

impl Config {
    /// Load from the process environment and, if present, the config file.
    ///
    /// The file is `BLINKWATCH_CONFIG` when set (must exist), otherwise
    /// `$XDG_CONFIG_HOME/blinkwatch/config.toml` when it exists.
    pub fn load() -> Result<Self, ConfigError> {
        let env = |key: &str| std::env::var(key).ok();

        let file = match env("BLINKWATCH_CONFIG") {
            Some(path) => Some(FileConfig::load(Path::new(&path))?),
            None => {
                let default_path = config_dir(&env).join("blinkwatch/config.toml");
                if default_path.exists() {
                    Some(FileConfig::load(&default_path)?)
                } else {
                    None
                }
            }
        };

        Ok(Self::from_layers(file, env))
    }

    /// Merge the layers. `env` looks up one variable by name.
    pub fn from_layers(file: Option<FileConfig>, env: impl Fn(&str) -> Option<String>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::defaults(&env);

        Self {
            recording_path: env("BLINKWATCH_RECORDING")
                .map(PathBuf::from)
                .or(file.recording_path)
                .unwrap_or(defaults.recording_path),
            loop_recording: env_bool(&env, "BLINKWATCH_LOOP")
                .or(file.loop_recording)
                .unwrap_or(defaults.loop_recording),
            warmup_ms: env_u64(&env, "BLINKWATCH_WARMUP_MS")
                .or(file.warmup_ms)
                .unwrap_or(defaults.warmup_ms),
            frame_interval_ms: env_u64(&env, "BLINKWATCH_FRAME_INTERVAL_MS")
                .or(file.frame_interval_ms)
                .unwrap_or(defaults.frame_interval_ms),
            blink_debounce_ms: env_u64(&env, "BLINKWATCH_BLINK_DEBOUNCE_MS")
                .or(file.blink_debounce_ms)
                .unwrap_or(defaults.blink_debounce_ms),
            eye_open_threshold_ms: env_u64(&env, "BLINKWATCH_EYE_OPEN_THRESHOLD_MS")
                .or(file.eye_open_threshold_ms)
                .unwrap_or(defaults.eye_open_threshold_ms),
        }
    }

    fn defaults(env: &impl Fn(&str) -> Option<String>) -> Self {
        let thresholds = Thresholds::default();
        Self {
            recording_path: data_dir(env).join("blinkwatch/recording.jsonl"),
            loop_recording: false,
            warmup_ms: 3000,
            frame_interval_ms: 16,
            blink_debounce_ms: thresholds.blink_debounce_ms,
            eye_open_threshold_ms: thresholds.eye_open_threshold_ms,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            blink_debounce_ms: self.blink_debounce_ms,
            eye_open_threshold_ms: self.eye_open_threshold_ms,
        }
    }

    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// Never zero, so the sampler loop always yields between ticks.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.max(1))
    }
}

fn home(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    PathBuf::from(env("HOME").unwrap_or_else(|| "/tmp".to_string()))
}

fn data_dir(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    env("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home(env).join(".local/share"))
}

fn config_dir(env: &impl Fn(&str) -> Option<String>) -> PathBuf {
    env("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| home(env).join(".config"))
}

fn env_u64(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    env(key).and_then(|v| v.parse().ok())
}

fn env_bool(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    env(key).map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_layers(None, env_from(&[("HOME", "/home/u")]));
        assert_eq!(cfg.recording_path, PathBuf::from("/home/u/.local/share/blinkwatch/recording.jsonl"));
        assert!(!cfg.loop_recording);
        assert_eq!(cfg.warmup_ms, 3000);
        assert_eq!(cfg.frame_interval_ms, 16);
        assert_eq!(cfg.thresholds(), Thresholds::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = FileConfig::parse(
            "warmup_ms = 500\nblink_debounce_ms = 250\nloop_recording = true\n",
            Path::new("test.toml"),
        )
        .unwrap();
        let cfg = Config::from_layers(Some(file), env_from(&[]));
        assert_eq!(cfg.warmup_ms, 500);
        assert_eq!(cfg.blink_debounce_ms, 250);
        assert!(cfg.loop_recording);
        assert_eq!(cfg.eye_open_threshold_ms, 10_000);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig::parse(
            "warmup_ms = 500\nrecording_path = \"/from/file.jsonl\"\n",
            Path::new("test.toml"),
        )
        .unwrap();
        let cfg = Config::from_layers(
            Some(file),
            env_from(&[
                ("BLINKWATCH_WARMUP_MS", "0"),
                ("BLINKWATCH_RECORDING", "/from/env.jsonl"),
                ("BLINKWATCH_LOOP", "1"),
            ]),
        );
        assert_eq!(cfg.warmup_ms, 0);
        assert_eq!(cfg.recording_path, PathBuf::from("/from/env.jsonl"));
        assert!(cfg.loop_recording);
    }

    #[test]
    fn test_unparsable_env_falls_through() {
        let file = FileConfig::parse("frame_interval_ms = 33\n", Path::new("test.toml")).unwrap();
        let cfg = Config::from_layers(
            Some(file),
            env_from(&[
                ("BLINKWATCH_FRAME_INTERVAL_MS", "fast"),
                ("BLINKWATCH_EYE_OPEN_THRESHOLD_MS", "-1"),
            ]),
        );
        assert_eq!(cfg.frame_interval_ms, 33);
        assert_eq!(cfg.eye_open_threshold_ms, 10_000);
    }

    #[test]
    fn test_loop_flag_spellings() {
        for (value, expected) in [("0", false), ("false", false), ("FALSE", false), ("1", true), ("yes", true)] {
            let cfg = Config::from_layers(None, env_from(&[("BLINKWATCH_LOOP", value)]));
            assert_eq!(cfg.loop_recording, expected, "BLINKWATCH_LOOP={value}");
        }
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = FileConfig::parse("ear_threshold = 0.3\n", Path::new("test.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_zero_frame_interval_clamped() {
        let cfg = Config::from_layers(None, env_from(&[("BLINKWATCH_FRAME_INTERVAL_MS", "0")]));
        assert_eq!(cfg.frame_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_xdg_data_home() {
        let cfg = Config::from_layers(None, env_from(&[("XDG_DATA_HOME", "/data")]));
        assert_eq!(cfg.recording_path, PathBuf::from("/data/blinkwatch/recording.jsonl"));
    }
}
