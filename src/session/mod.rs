//! Dictation session orchestration
//!
//! The controller only talks to its collaborators through the traits below,
//! so the turn-taking logic runs the same against the live microphone and
//! websocket as against in-memory doubles.

pub mod controller;
pub mod factory;

use std::sync::Arc;

use crate::audio::ChunkSink;
use crate::network::EventHandler;

pub use controller::{ControllerInput, DictationEvent, TurnController};
pub use factory::LiveSessionFactory;

/// Microphone side of a session
pub trait CaptureSource: Send {
    /// Bring the device up; false on any failure
    fn start(&mut self) -> bool;

    /// Stop delivering chunks without waiting
    fn pause_streaming(&self);

    /// Release the device, blocking up to a bounded timeout
    fn stop(&mut self);

    fn amplitude(&self) -> f32;
}

/// Network side of a session
pub trait RealtimeTransport: Send + Sync {
    fn connect(&self, credential: &str, model: &str);
    fn send_audio(&self, pcm: &[u8]);
    fn commit_audio(&self);
    fn disconnect(&self);
    fn is_connected(&self) -> bool;
}

/// Builds the fresh collaborators each `start()` needs
pub trait SessionFactory {
    fn create_transport(&self, instructions: &str, handler: EventHandler)
        -> Arc<dyn RealtimeTransport>;

    fn create_capture(&self, sink: ChunkSink) -> Box<dyn CaptureSource>;
}

/// Hands an inbound event to the thread that owns the controller
pub trait OwnerDispatch: Send + Sync {
    fn post(&self, input: ControllerInput);
}

impl OwnerDispatch for crossbeam_channel::Sender<ControllerInput> {
    fn post(&self, input: ControllerInput) {
        if self.send(input).is_err() {
            tracing::debug!("Owner inbox closed; dropping event");
        }
    }
}
