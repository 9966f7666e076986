//! Realtime wire codec
//!
//! Stateless conversion between engine events and JSON text frames.

pub mod encoder;
pub mod decoder;

pub use encoder::{encode_audio_append, encode_audio_commit, encode_session_update, ClientFrame};
pub use decoder::decode;
