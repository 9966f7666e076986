//! Inbound frame decoder
//!
//! Decoding never fails: malformed input becomes [`ServerEvent::Error`]
//! carrying a diagnostic, so the caller handles it like any other event.

use serde_json::Value;

use crate::error::CodecError;
use crate::protocol::ServerEvent;

/// Decode one text frame.
///
/// Returns `None` for well-formed events the engine does not consume
/// (`session.created`, `response.created`, ...).
pub fn decode(frame: &str) -> Option<ServerEvent> {
    match try_decode(frame) {
        Ok(event) => event,
        Err(e) => Some(ServerEvent::Error(e.to_string())),
    }
}

fn try_decode(frame: &str) -> Result<Option<ServerEvent>, CodecError> {
    let value: Value =
        serde_json::from_str(frame).map_err(|e| CodecError::Malformed(e.to_string()))?;

    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(CodecError::MissingType)?;

    let event = match event_type {
        "session.updated" => ServerEvent::SessionReady,
        "response.output_text.delta" => {
            ServerEvent::TextDelta(required_str(&value, event_type, "delta")?)
        }
        "response.output_text.done" => {
            ServerEvent::TextDone(required_str(&value, event_type, "text")?)
        }
        "input_audio_buffer.speech_started" => ServerEvent::SpeechStarted {
            audio_start_ms: optional_u64(&value, "audio_start_ms"),
        },
        "input_audio_buffer.speech_stopped" => ServerEvent::SpeechStopped {
            audio_end_ms: optional_u64(&value, "audio_end_ms"),
        },
        "conversation.item.input_audio_transcription.completed" => {
            ServerEvent::TranscriptionCompleted(required_str(&value, event_type, "transcript")?)
        }
        "response.done" => ServerEvent::ResponseDone,
        "error" => ServerEvent::Error(error_message(&value)),
        other => {
            tracing::trace!("Ignoring server event {}", other);
            return Ok(None);
        }
    };

    Ok(Some(event))
}

fn required_str(value: &Value, event: &str, field: &'static str) -> Result<String, CodecError> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CodecError::MissingField {
            event: event.to_string(),
            field,
        })
}

// Offsets are informational only; a missing one is not worth failing the turn.
fn optional_u64(value: &Value, field: &str) -> u64 {
    value.get(field).and_then(Value::as_u64).unwrap_or(0)
}

fn error_message(value: &Value) -> String {
    let Some(error) = value.get("error") else {
        return "server error".to_string();
    };

    ["message", "code", "type"]
        .iter()
        .filter_map(|key| error.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("server error")
        .to_string()
}
