//! Outbound frame encoder
//!
//! Builds the three client frames the engine ever sends: the session
//! handshake, audio append, and audio commit.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;

use crate::config::SessionConfig;
use crate::error::CodecError;

/// Client -> server frame
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame<'a> {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionPayload<'a> },

    #[serde(rename = "input_audio_buffer.append")]
    AudioAppend { audio: String },

    #[serde(rename = "input_audio_buffer.commit")]
    AudioCommit,
}

#[derive(Debug, Serialize)]
pub struct SessionPayload<'a> {
    pub instructions: &'a str,
    pub turn_detection: TurnDetection,
    pub input_audio_transcription: InputTranscription<'a>,
    pub output_modalities: [&'static str; 1],
}

#[derive(Debug, Serialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub threshold: f32,
    pub silence_duration_ms: u32,
}

#[derive(Debug, Serialize)]
pub struct InputTranscription<'a> {
    pub model: &'a str,
}

impl<'a> ClientFrame<'a> {
    /// `session.update` handshake with server VAD and text-only output
    pub fn session_update(config: &'a SessionConfig) -> Self {
        ClientFrame::SessionUpdate {
            session: SessionPayload {
                instructions: &config.instructions,
                turn_detection: TurnDetection {
                    kind: "server_vad",
                    threshold: config.vad_threshold,
                    silence_duration_ms: config.silence_duration_ms,
                },
                input_audio_transcription: InputTranscription {
                    model: &config.transcription_model,
                },
                output_modalities: ["text"],
            },
        }
    }

    /// `input_audio_buffer.append` carrying base64 PCM16LE
    pub fn audio_append(pcm: &[u8]) -> Self {
        ClientFrame::AudioAppend {
            audio: BASE64.encode(pcm),
        }
    }

    /// Serialize to a JSON text frame
    pub fn to_json(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(|e| CodecError::EncodingFailed(e.to_string()))
    }
}

/// Encode the session handshake
pub fn encode_session_update(config: &SessionConfig) -> Result<String, CodecError> {
    ClientFrame::session_update(config).to_json()
}

/// Encode one PCM chunk
pub fn encode_audio_append(pcm: &[u8]) -> Result<String, CodecError> {
    ClientFrame::audio_append(pcm).to_json()
}

/// Encode the commit signal
pub fn encode_audio_commit() -> Result<String, CodecError> {
    ClientFrame::AudioCommit.to_json()
}
