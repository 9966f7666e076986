//! Shared protocol and state types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event received from the realtime endpoint, after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// Session configuration accepted (`session.updated`)
    SessionReady,
    /// Incremental response text
    TextDelta(String),
    /// Final response text for the current utterance
    TextDone(String),
    /// Server VAD detected the start of speech
    SpeechStarted { audio_start_ms: u64 },
    /// Server VAD detected the end of an utterance
    SpeechStopped { audio_end_ms: u64 },
    /// Transcript of the committed input audio
    TranscriptionCompleted(String),
    /// Response for the committed utterance is complete
    ResponseDone,
    /// Server, protocol or transport failure
    Error(String),
}

impl ServerEvent {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::SessionReady => "session_ready",
            ServerEvent::TextDelta(_) => "text_delta",
            ServerEvent::TextDone(_) => "text_done",
            ServerEvent::SpeechStarted { .. } => "speech_started",
            ServerEvent::SpeechStopped { .. } => "speech_stopped",
            ServerEvent::TranscriptionCompleted(_) => "transcription_completed",
            ServerEvent::ResponseDone => "response_done",
            ServerEvent::Error(_) => "error",
        }
    }
}

/// Turn-taking state of a dictation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// No session; nothing is held open
    Idle,
    /// Waiting for the endpoint to accept the session
    Connecting,
    /// Microphone live, audio streaming
    Recording,
    /// Utterance ended; waiting for the response
    Processing,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::Connecting => "connecting",
            TurnState::Recording => "recording",
            TurnState::Processing => "processing",
        };
        f.write_str(name)
    }
}

/// Connection state of a protocol client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Capture state of an audio stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
}

/// Input device description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    pub name: String,
    pub is_default: bool,
    pub sample_rates: Vec<u32>,
    pub channels: Vec<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_state_display() {
        assert_eq!(TurnState::Processing.to_string(), "processing");
        assert_eq!(
            serde_json::to_string(&TurnState::Connecting).unwrap(),
            "\"connecting\""
        );
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(ServerEvent::TextDelta("a".into()).kind(), "text_delta");
        assert_eq!(
            ServerEvent::SpeechStopped { audio_end_ms: 10 }.kind(),
            "speech_stopped"
        );
    }
}
