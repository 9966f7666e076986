//! Realtime protocol client
//!
//! Owns one websocket connection at a time. All I/O runs on a tokio task;
//! the public methods only touch a short critical section and an unbounded
//! channel, so they are safe to call from the capture thread or from inside
//! an event handler.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::codec::{self, encode_audio_append, encode_audio_commit, encode_session_update};
use crate::config::{RealtimeConfig, SessionConfig};
use crate::error::NetworkError;
use crate::network::ws::{self, endpoint_with_model, WsMessage};
use crate::protocol::{ConnectionState, ServerEvent};

/// Receives every decoded server event, on a runtime worker thread
pub type EventHandler = Arc<dyn Fn(ServerEvent) + Send + Sync>;

enum Outbound {
    Frame(String),
    Close,
}

struct Shared {
    /// Bumped by every connect/disconnect; tasks from older epochs go quiet
    epoch: u64,
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
}

struct Inner {
    runtime: Handle,
    realtime: RealtimeConfig,
    session: SessionConfig,
    handler: EventHandler,
    shared: Mutex<Shared>,
}

/// Cloneable handle to a realtime connection
#[derive(Clone)]
pub struct ProtocolClient {
    inner: Arc<Inner>,
}

impl ProtocolClient {
    pub fn new(
        runtime: Handle,
        realtime: RealtimeConfig,
        session: SessionConfig,
        handler: EventHandler,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                runtime,
                realtime,
                session,
                handler,
                shared: Mutex::new(Shared {
                    epoch: 0,
                    state: ConnectionState::Disconnected,
                    outbound: None,
                }),
            }),
        }
    }

    /// Open a new connection, closing any previous one first.
    ///
    /// Returns immediately; the outcome arrives through the handler as
    /// `SessionReady` or `Error`.
    pub fn connect(&self, credential: &str, model: &str) {
        let (tx, rx) = mpsc::unbounded_channel();

        let epoch = {
            let mut shared = self.inner.shared.lock();
            if let Some(previous) = shared.outbound.take() {
                tracing::debug!("Closing superseded connection");
                let _ = previous.send(Outbound::Close);
            }
            shared.epoch += 1;
            shared.state = ConnectionState::Disconnected;
            shared.outbound = Some(tx);
            shared.epoch
        };

        let url = endpoint_with_model(&self.inner.realtime.url, model);
        let credential = credential.to_string();
        let inner = self.inner.clone();

        tracing::info!("Connecting to {}", url);
        self.inner
            .runtime
            .spawn(async move { inner.run_connection(epoch, url, credential, rx).await });
    }

    /// Queue one PCM16LE chunk. Dropped silently when not connected.
    pub fn send_audio(&self, pcm: &[u8]) {
        if pcm.is_empty() || !self.is_connected() {
            return;
        }

        match encode_audio_append(pcm) {
            Ok(frame) => self.send_frame(frame),
            Err(e) => tracing::warn!("Dropping audio chunk: {}", e),
        }
    }

    /// Ask the server to finalize the buffered audio as one utterance
    pub fn commit_audio(&self) {
        if !self.is_connected() {
            tracing::warn!("Commit dropped: not connected");
            return;
        }

        match encode_audio_commit() {
            Ok(frame) => {
                tracing::debug!("Committing input audio buffer");
                self.send_frame(frame);
            }
            Err(e) => tracing::warn!("Commit dropped: {}", e),
        }
    }

    fn send_frame(&self, frame: String) {
        let shared = self.inner.shared.lock();
        if shared.state != ConnectionState::Connected {
            return;
        }
        if let Some(tx) = &shared.outbound {
            let _ = tx.send(Outbound::Frame(frame));
        }
    }

    /// Close with a normal-closure code. Idempotent.
    pub fn disconnect(&self) {
        let mut shared = self.inner.shared.lock();
        shared.epoch += 1;
        shared.state = ConnectionState::Disconnected;
        if let Some(tx) = shared.outbound.take() {
            tracing::info!("Disconnecting");
            let _ = tx.send(Outbound::Close);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.shared.lock().state
    }
}

impl Inner {
    fn mark_connected(&self, epoch: u64) -> bool {
        let mut shared = self.shared.lock();
        if shared.epoch != epoch {
            return false;
        }
        shared.state = ConnectionState::Connected;
        true
    }

    fn dispatch(&self, epoch: u64, event: ServerEvent) {
        if self.shared.lock().epoch != epoch {
            tracing::trace!("Dropping {} from superseded connection", event.kind());
            return;
        }
        (self.handler)(event);
    }

    /// Tear down after a transport failure; reported only if this
    /// connection is still the live one
    fn fail(&self, epoch: u64, error: NetworkError) {
        let current = {
            let mut shared = self.shared.lock();
            if shared.epoch == epoch {
                shared.state = ConnectionState::Disconnected;
                shared.outbound = None;
                true
            } else {
                false
            }
        };

        if current {
            tracing::warn!("Connection failed: {}", error);
            (self.handler)(ServerEvent::Error(error.to_string()));
        } else {
            tracing::debug!("Superseded connection ended: {}", error);
        }
    }

    async fn run_connection(
        self: Arc<Self>,
        epoch: u64,
        url: String,
        credential: String,
        mut rx: mpsc::UnboundedReceiver<Outbound>,
    ) {
        let headers = [("Authorization", format!("Bearer {}", credential))];
        let timeout = Duration::from_millis(self.realtime.connect_timeout_ms);

        let (mut writer, mut reader) =
            match tokio::time::timeout(timeout, ws::connect(&url, &headers)).await {
                Ok(Ok(halves)) => halves,
                Ok(Err(e)) => return self.fail(epoch, e),
                Err(_) => return self.fail(epoch, NetworkError::Timeout),
            };

        let handshake = match encode_session_update(&self.session) {
            Ok(frame) => frame,
            Err(e) => {
                let _ = writer.close_normal().await;
                return self.fail(epoch, NetworkError::SendFailed(e.to_string()));
            }
        };

        if !self.mark_connected(epoch) {
            let _ = writer.close_normal().await;
            return;
        }

        tracing::info!("Connected; sending session configuration");
        if let Err(e) = writer.send_text(handshake).await {
            return self.fail(epoch, e);
        }

        loop {
            tokio::select! {
                outbound = rx.recv() => match outbound {
                    Some(Outbound::Frame(frame)) => {
                        if let Err(e) = writer.send_text(frame).await {
                            self.fail(epoch, e);
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        if let Err(e) = writer.close_normal().await {
                            tracing::debug!("Close handshake failed: {}", e);
                        }
                        break;
                    }
                },
                inbound = reader.recv() => match inbound {
                    Some(Ok(WsMessage::Text(text))) => {
                        if let Some(event) = codec::decode(&text) {
                            self.dispatch(epoch, event);
                        }
                    }
                    Some(Ok(WsMessage::Binary(data))) => {
                        tracing::debug!("Ignoring {} byte binary frame", data.len());
                    }
                    Some(Ok(WsMessage::Close { code, reason })) => {
                        self.fail(epoch, NetworkError::ClosedByServer { code, reason });
                        break;
                    }
                    Some(Err(e)) => {
                        self.fail(epoch, e);
                        break;
                    }
                    None => {
                        self.fail(epoch, NetworkError::ClosedByServer {
                            code: 1006,
                            reason: "connection dropped".to_string(),
                        });
                        break;
                    }
                },
            }
        }
    }
}
