//! Live collaborators: cpal capture and the websocket protocol client

use std::sync::Arc;
use tokio::runtime::Handle;

use crate::audio::{AudioCaptureStream, ChunkSink};
use crate::config::AppConfig;
use crate::network::{EventHandler, ProtocolClient};
use crate::session::{CaptureSource, RealtimeTransport, SessionFactory};

impl CaptureSource for AudioCaptureStream {
    fn start(&mut self) -> bool {
        AudioCaptureStream::start(self)
    }

    fn pause_streaming(&self) {
        AudioCaptureStream::pause_streaming(self)
    }

    fn stop(&mut self) {
        AudioCaptureStream::stop(self)
    }

    fn amplitude(&self) -> f32 {
        AudioCaptureStream::amplitude(self)
    }
}

impl RealtimeTransport for ProtocolClient {
    fn connect(&self, credential: &str, model: &str) {
        ProtocolClient::connect(self, credential, model)
    }

    fn send_audio(&self, pcm: &[u8]) {
        ProtocolClient::send_audio(self, pcm)
    }

    fn commit_audio(&self) {
        ProtocolClient::commit_audio(self)
    }

    fn disconnect(&self) {
        ProtocolClient::disconnect(self)
    }

    fn is_connected(&self) -> bool {
        ProtocolClient::is_connected(self)
    }
}

/// Builds real devices and connections from the app config
pub struct LiveSessionFactory {
    runtime: Handle,
    config: AppConfig,
}

impl LiveSessionFactory {
    pub fn new(runtime: Handle, config: AppConfig) -> Self {
        Self { runtime, config }
    }
}

impl SessionFactory for LiveSessionFactory {
    fn create_transport(
        &self,
        instructions: &str,
        handler: EventHandler,
    ) -> Arc<dyn RealtimeTransport> {
        let mut session = self.config.session.clone();
        session.instructions = instructions.to_string();

        Arc::new(ProtocolClient::new(
            self.runtime.clone(),
            self.config.realtime.clone(),
            session,
            handler,
        ))
    }

    fn create_capture(&self, sink: ChunkSink) -> Box<dyn CaptureSource> {
        Box::new(AudioCaptureStream::new(self.config.capture.clone(), sink))
    }
}
