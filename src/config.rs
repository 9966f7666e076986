//! Application configuration
//!
//! Loaded from a TOML file; every field has a default so a partial (or
//! missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::{Error, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub realtime: RealtimeConfig,
    pub session: SessionConfig,
    pub capture: CaptureConfig,
}

/// Realtime endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Websocket endpoint; the model is appended as `?model=`
    pub url: String,
    /// Handshake timeout
    pub connect_timeout_ms: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_REALTIME_URL.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// Parameters sent in the `session.update` handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub model: String,
    pub instructions: String,
    pub vad_threshold: f32,
    pub silence_duration_ms: u32,
    pub transcription_model: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_REALTIME_MODEL.to_string(),
            instructions: String::new(),
            vad_threshold: DEFAULT_VAD_THRESHOLD,
            silence_duration_ms: DEFAULT_SILENCE_DURATION_MS,
            transcription_model: DEFAULT_TRANSCRIPTION_MODEL.to_string(),
        }
    }
}

/// Microphone capture settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Input device name; `None` uses the host default
    pub device: Option<String>,
    pub sample_rate: u32,
    pub chunk_ms: u32,
    pub stop_timeout_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_ms: DEFAULT_CHUNK_MS,
            stop_timeout_ms: DEFAULT_STOP_TIMEOUT_MS,
        }
    }
}

impl CaptureConfig {
    /// Samples (mono) per chunk
    pub fn chunk_samples(&self) -> usize {
        (self.sample_rate as usize * self.chunk_ms as usize) / 1000
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "realtime-dictation")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location, falling back to defaults when the
    /// file does not exist
    pub fn load_or_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {}", path.display());
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.session.vad_threshold) {
            return Err(Error::Config(format!(
                "vad_threshold must be within [0, 1], got {}",
                self.session.vad_threshold
            )));
        }
        if self.session.silence_duration_ms == 0 {
            return Err(Error::Config("silence_duration_ms must be > 0".into()));
        }
        if self.capture.sample_rate == 0 || self.capture.chunk_samples() == 0 {
            return Err(Error::Config(format!(
                "capture chunk is empty ({} Hz, {} ms)",
                self.capture.sample_rate, self.capture.chunk_ms
            )));
        }
        if !self.realtime.url.starts_with("ws://") && !self.realtime.url.starts_with("wss://") {
            return Err(Error::Config(format!(
                "realtime url must be ws:// or wss://, got {}",
                self.realtime.url
            )));
        }
        Ok(())
    }
}
