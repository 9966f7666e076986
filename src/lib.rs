//! # Realtime Dictation
//!
//! Voice dictation front end with server-driven turn taking.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                                CLIENT                                    │
//! │  ┌─────────────┐                                                         │
//! │  │ Microphone  │                                                         │
//! │  └──────┬──────┘                                                         │
//! │         │ cpal callback                                                  │
//! │         ▼                                                                │
//! │  ┌─────────────────────────────┐   PCM16LE chunks (~100 ms)              │
//! │  │ AudioCaptureStream          │──────────────────────┐                  │
//! │  │ (audio::capture) - Thread   │                      │                  │
//! │  └──────┬──────────────────────┘                      ▼                  │
//! │         │ start / pause / stop          ┌──────────────────────────┐     │
//! │         │                               │ ProtocolClient           │     │
//! │  ┌──────┴──────────────────────┐        │ (network::client)        │     │
//! │  │ TurnController              │◄───────│ codec encode / decode    │     │
//! │  │ (session::controller)       │ posted │ tokio I/O task           │     │
//! │  │ Owner thread                │ events └────────────┬─────────────┘     │
//! │  └──────┬──────────────────────┘                     │                   │
//! │         │ DictationEvent                             │                   │
//! │         ▼                                            │                   │
//! │  ┌─────────────────────────────┐                     │                   │
//! │  │ Editor integration          │                     │                   │
//! │  └─────────────────────────────┘                     │                   │
//! └──────────────────────────────────────────────────────┼───────────────────┘
//!                                                        │ JSON over websocket
//!                                                        ▼
//!                                        ┌──────────────────────────────┐
//!                                        │ Realtime speech endpoint     │
//!                                        │ (server VAD, transcription)  │
//!                                        └──────────────────────────────┘
//! ```

pub mod audio;
pub mod codec;
pub mod config;
pub mod error;
pub mod network;
pub mod protocol;
pub mod session;

pub use error::{Error, Result};

/// Application-wide constants
pub mod constants {
    /// Capture sample rate expected by the realtime endpoint
    pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

    /// Capture is always mono
    pub const DEFAULT_CHANNELS: u16 = 1;

    /// Duration of one PCM chunk handed to the network
    pub const DEFAULT_CHUNK_MS: u32 = 100;

    /// Bounded wait when joining the capture thread
    pub const DEFAULT_STOP_TIMEOUT_MS: u64 = 1000;

    /// How long `start()` waits for the device to come up
    pub const DEVICE_INIT_TIMEOUT_MS: u64 = 2000;

    /// Server VAD activation threshold
    pub const DEFAULT_VAD_THRESHOLD: f32 = 0.5;

    /// Trailing silence that ends an utterance
    pub const DEFAULT_SILENCE_DURATION_MS: u32 = 500;

    /// Model used for input audio transcription
    pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";

    /// Realtime model requested on connect
    pub const DEFAULT_REALTIME_MODEL: &str = "gpt-realtime";

    /// Realtime websocket endpoint
    pub const DEFAULT_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

    /// Websocket handshake timeout
    pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

    /// Capacity of the callback -> capture loop sample queue (in blocks)
    pub const SAMPLE_QUEUE_CAPACITY: usize = 256;
}
