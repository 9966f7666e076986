//! Turn-taking state machine
//!
//! ```text
//!   Idle ──start──► Connecting ──SessionReady──► Recording ◄──────────┐
//!    ▲                                              │                 │
//!    │                          SpeechStopped / stop()                │
//!    │                                              ▼                 │
//!    └──── pending stop / restart failure ───── Processing ──ResponseDone
//! ```
//!
//! The controller is plain single-threaded logic. Events from the transport
//! never touch it directly: they are posted to the owner thread through
//! [`OwnerDispatch`] and fed back in with [`TurnController::handle`].

use crossbeam_channel::Sender;
use std::sync::Arc;
use tracing::Span;
use uuid::Uuid;

use crate::audio::ChunkSink;
use crate::network::EventHandler;
use crate::protocol::{ServerEvent, TurnState};
use crate::session::{CaptureSource, OwnerDispatch, RealtimeTransport, SessionFactory};

/// Output towards the editor integration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictationEvent {
    StateChanged(TurnState),
    /// Cumulative text of the utterance being composed
    ComposingText(String),
    /// Final text for one utterance
    CommitText(String),
    Error(String),
}

/// A server event tagged with the session that produced it
#[derive(Debug, Clone)]
pub struct ControllerInput {
    pub generation: u64,
    pub event: ServerEvent,
}

pub struct TurnController<F: SessionFactory> {
    factory: F,
    dispatch: Arc<dyn OwnerDispatch>,
    output: Sender<DictationEvent>,

    state: TurnState,

    /// Bumped on every start and cleanup; inputs from older sessions are dropped
    generation: u64,

    capture: Option<Box<dyn CaptureSource>>,
    transport: Option<Arc<dyn RealtimeTransport>>,

    /// Fragments of the current utterance, in arrival order
    composing: Vec<String>,
    pending_stop: bool,

    span: Span,
}

impl<F: SessionFactory> TurnController<F> {
    pub fn new(factory: F, dispatch: Arc<dyn OwnerDispatch>, output: Sender<DictationEvent>) -> Self {
        Self {
            factory,
            dispatch,
            output,
            state: TurnState::Idle,
            generation: 0,
            capture: None,
            transport: None,
            composing: Vec::new(),
            pending_stop: false,
            span: Span::none(),
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn pending_stop(&self) -> bool {
        self.pending_stop
    }

    pub fn composing_text(&self) -> String {
        self.composing.concat()
    }

    /// Live input level, 0.0 when nothing is capturing
    pub fn amplitude(&self) -> f32 {
        self.capture.as_ref().map(|c| c.amplitude()).unwrap_or(0.0)
    }

    /// Begin a session. Ignored (returns false) unless Idle.
    pub fn start(&mut self, credential: &str, model: &str, instructions: &str) -> bool {
        if self.state != TurnState::Idle {
            tracing::debug!("start() ignored in state {}", self.state);
            return false;
        }

        self.generation += 1;
        self.composing.clear();
        self.pending_stop = false;
        self.span = tracing::info_span!("session", id = %Uuid::new_v4());
        let _enter = self.span.clone().entered();

        let generation = self.generation;
        let dispatch = self.dispatch.clone();
        let handler: EventHandler =
            Arc::new(move |event| dispatch.post(ControllerInput { generation, event }));

        let transport = self.factory.create_transport(instructions, handler);
        let sink_transport = transport.clone();
        let sink: ChunkSink = Arc::new(move |pcm: &[u8]| sink_transport.send_audio(pcm));
        let capture = self.factory.create_capture(sink);

        self.transport = Some(transport.clone());
        self.capture = Some(capture);

        tracing::info!("Starting dictation session with model {}", model);
        self.set_state(TurnState::Connecting);
        transport.connect(credential, model);
        true
    }

    /// User stop: let the current utterance finish, then end the session
    pub fn stop(&mut self) {
        let _enter = self.span.clone().entered();

        match self.state {
            TurnState::Recording => {
                self.stop_capture();
                if let Some(transport) = &self.transport {
                    transport.commit_audio();
                }
                self.pending_stop = true;
                self.set_state(TurnState::Processing);
            }
            TurnState::Processing => {
                tracing::debug!("Stop requested while processing; deferring");
                self.pending_stop = true;
            }
            TurnState::Connecting => {
                tracing::info!("Stop requested before session was ready");
                self.cleanup();
            }
            TurnState::Idle => {}
        }
    }

    /// Release everything and return to Idle, from any state
    pub fn cleanup(&mut self) {
        let _enter = self.span.clone().entered();

        self.generation += 1;
        self.stop_capture();
        self.capture = None;

        if let Some(transport) = self.transport.take() {
            transport.disconnect();
        }

        self.composing.clear();
        self.pending_stop = false;

        if self.state != TurnState::Idle {
            self.set_state(TurnState::Idle);
        }
        self.span = Span::none();
    }

    /// Apply one posted event. Must be called on the owner thread.
    pub fn handle(&mut self, input: ControllerInput) {
        if input.generation != self.generation || self.state == TurnState::Idle {
            tracing::trace!("Dropping stale {}", input.event.kind());
            return;
        }

        let _enter = self.span.clone().entered();
        match input.event {
            ServerEvent::SessionReady => self.on_session_ready(),
            ServerEvent::TextDelta(delta) => {
                if self.is_turn_active() {
                    self.composing.push(delta);
                    self.emit(DictationEvent::ComposingText(self.composing.concat()));
                }
            }
            ServerEvent::TextDone(text) => {
                if self.is_turn_active() {
                    self.composing.clear();
                    self.emit(DictationEvent::CommitText(text));
                }
            }
            ServerEvent::SpeechStarted { audio_start_ms } => {
                tracing::debug!("Speech started at {} ms", audio_start_ms);
            }
            ServerEvent::SpeechStopped { audio_end_ms } => {
                if self.state == TurnState::Recording {
                    tracing::debug!("Speech stopped at {} ms", audio_end_ms);
                    self.stop_capture();
                    self.set_state(TurnState::Processing);
                }
            }
            ServerEvent::TranscriptionCompleted(transcript) => {
                tracing::debug!("Input transcript: {}", transcript);
            }
            ServerEvent::ResponseDone => match self.state {
                TurnState::Processing => self.on_response_done(),
                TurnState::Recording => self.restart_capture(),
                _ => {}
            },
            ServerEvent::Error(message) => {
                tracing::error!("Session error: {}", message);
                self.emit(DictationEvent::Error(message));
                self.cleanup();
            }
        }
    }

    fn on_session_ready(&mut self) {
        if self.state != TurnState::Connecting {
            tracing::debug!("Ignoring session ready in state {}", self.state);
            return;
        }

        if self.start_capture() {
            self.set_state(TurnState::Recording);
        } else {
            self.emit(DictationEvent::Error("Failed to start audio capture".to_string()));
            self.cleanup();
        }
    }

    fn on_response_done(&mut self) {
        if self.pending_stop {
            tracing::info!("Utterance finished; ending session");
            self.cleanup();
            return;
        }

        if self.start_capture() {
            self.set_state(TurnState::Recording);
        } else {
            // Not surfaced: the session simply ends
            tracing::warn!("Capture restart failed; ending session");
            self.cleanup();
        }
    }

    // Response finished without a speech-stopped boundary: the turn still
    // ends here, so the device is cycled for the next utterance
    fn restart_capture(&mut self) {
        self.stop_capture();
        if !self.start_capture() {
            tracing::warn!("Capture restart failed; ending session");
            self.cleanup();
        }
    }

    fn is_turn_active(&self) -> bool {
        matches!(self.state, TurnState::Recording | TurnState::Processing)
    }

    fn start_capture(&mut self) -> bool {
        self.capture.as_mut().map(|c| c.start()).unwrap_or(false)
    }

    // Pause first so the sink is not fed while the device shuts down
    fn stop_capture(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.pause_streaming();
            capture.stop();
        }
    }

    fn set_state(&mut self, state: TurnState) {
        tracing::info!("State {} -> {}", self.state, state);
        self.state = state;
        self.emit(DictationEvent::StateChanged(state));
    }

    fn emit(&self, event: DictationEvent) {
        if self.output.send(event).is_err() {
            tracing::debug!("Dictation output closed");
        }
    }
}

impl<F: SessionFactory> Drop for TurnController<F> {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{unbounded, Receiver};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Everything the doubles observe, shared with the test
    #[derive(Default)]
    struct World {
        log: Vec<&'static str>,
        capture_starts: usize,
        capture_running: bool,
        start_results: VecDeque<bool>,
        connects: usize,
        commits: usize,
        disconnects: usize,
        connected: bool,
        audio_chunks: usize,
        instructions: String,
        handler: Option<EventHandler>,
    }

    type SharedWorld = Arc<Mutex<World>>;

    struct MockCapture {
        world: SharedWorld,
        sink: ChunkSink,
    }

    impl CaptureSource for MockCapture {
        fn start(&mut self) -> bool {
            let ok = {
                let mut world = self.world.lock();
                world.log.push("capture_start");
                world.capture_starts += 1;
                let ok = world.start_results.pop_front().unwrap_or(true);
                world.capture_running = ok;
                ok
            };
            if ok {
                (self.sink)(&[0, 0]);
            }
            ok
        }

        fn pause_streaming(&self) {
            self.world.lock().log.push("pause");
        }

        fn stop(&mut self) {
            let mut world = self.world.lock();
            world.log.push("stop");
            world.capture_running = false;
        }

        fn amplitude(&self) -> f32 {
            if self.world.lock().capture_running {
                0.25
            } else {
                0.0
            }
        }
    }

    struct MockTransport {
        world: SharedWorld,
    }

    impl RealtimeTransport for MockTransport {
        fn connect(&self, _credential: &str, _model: &str) {
            let mut world = self.world.lock();
            world.connects += 1;
            world.connected = true;
        }

        fn send_audio(&self, _pcm: &[u8]) {
            let mut world = self.world.lock();
            if world.connected {
                world.audio_chunks += 1;
            }
        }

        fn commit_audio(&self) {
            let mut world = self.world.lock();
            world.log.push("commit");
            world.commits += 1;
        }

        fn disconnect(&self) {
            let mut world = self.world.lock();
            world.disconnects += 1;
            world.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.world.lock().connected
        }
    }

    struct MockFactory {
        world: SharedWorld,
    }

    impl SessionFactory for MockFactory {
        fn create_transport(
            &self,
            instructions: &str,
            handler: EventHandler,
        ) -> Arc<dyn RealtimeTransport> {
            let mut world = self.world.lock();
            world.instructions = instructions.to_string();
            world.handler = Some(handler);
            Arc::new(MockTransport {
                world: self.world.clone(),
            })
        }

        fn create_capture(&self, sink: ChunkSink) -> Box<dyn CaptureSource> {
            Box::new(MockCapture {
                world: self.world.clone(),
                sink,
            })
        }
    }

    struct Harness {
        controller: TurnController<MockFactory>,
        world: SharedWorld,
        inbox: Receiver<ControllerInput>,
        events: Receiver<DictationEvent>,
    }

    impl Harness {
        fn new() -> Self {
            let world: SharedWorld = Arc::default();
            let (post_tx, inbox) = unbounded::<ControllerInput>();
            let (output, events) = unbounded();
            let controller = TurnController::new(
                MockFactory {
                    world: world.clone(),
                },
                Arc::new(post_tx),
                output,
            );
            Self {
                controller,
                world,
                inbox,
                events,
            }
        }

        fn start(&mut self) -> bool {
            self.controller.start("k", "m", "i")
        }

        /// Deliver an event the way the transport would, then run the owner loop
        fn fire(&mut self, event: ServerEvent) {
            let handler = self.world.lock().handler.clone().expect("no transport");
            handler(event);
            self.pump();
        }

        fn pump(&mut self) {
            while let Ok(input) = self.inbox.try_recv() {
                self.controller.handle(input);
            }
        }

        fn drain(&self) -> Vec<DictationEvent> {
            self.events.try_iter().collect()
        }

        fn reach(&mut self, state: TurnState) {
            match state {
                TurnState::Idle => {}
                TurnState::Connecting => {
                    self.start();
                }
                TurnState::Recording => {
                    self.start();
                    self.fire(ServerEvent::SessionReady);
                }
                TurnState::Processing => {
                    self.start();
                    self.fire(ServerEvent::SessionReady);
                    self.fire(ServerEvent::SpeechStopped { audio_end_ms: 900 });
                }
            }
            assert_eq!(self.controller.state(), state);
        }
    }

    const ALL_STATES: [TurnState; 4] = [
        TurnState::Idle,
        TurnState::Connecting,
        TurnState::Recording,
        TurnState::Processing,
    ];

    fn state_changes(events: &[DictationEvent]) -> Vec<TurnState> {
        events
            .iter()
            .filter_map(|e| match e {
                DictationEvent::StateChanged(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_scenario_a_single_turn_loops_back_to_recording() {
        let mut h = Harness::new();
        assert!(h.start());
        assert_eq!(h.world.lock().instructions, "i");

        h.fire(ServerEvent::SessionReady);
        assert_eq!(h.controller.state(), TurnState::Recording);
        assert!(h.world.lock().audio_chunks > 0);

        h.fire(ServerEvent::TextDelta("a".into()));
        h.fire(ServerEvent::TextDelta("b".into()));
        h.fire(ServerEvent::TextDone("ab".into()));
        assert_eq!(h.controller.composing_text(), "");

        h.world.lock().log.clear();
        h.fire(ServerEvent::ResponseDone);
        assert_eq!(h.controller.state(), TurnState::Recording);
        assert_eq!(h.world.lock().capture_starts, 2);
        assert_eq!(h.world.lock().log, vec!["pause", "stop", "capture_start"]);
        assert!(h.world.lock().capture_running);

        assert_eq!(
            h.drain(),
            vec![
                DictationEvent::StateChanged(TurnState::Connecting),
                DictationEvent::StateChanged(TurnState::Recording),
                DictationEvent::ComposingText("a".into()),
                DictationEvent::ComposingText("ab".into()),
                DictationEvent::CommitText("ab".into()),
            ]
        );
    }

    #[test]
    fn test_turn_through_processing_loops_back_to_recording() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);
        h.drain();

        h.fire(ServerEvent::SpeechStopped { audio_end_ms: 1000 });
        h.fire(ServerEvent::TextDone("ab".into()));
        h.fire(ServerEvent::ResponseDone);

        assert_eq!(h.controller.state(), TurnState::Recording);
        assert_eq!(h.world.lock().capture_starts, 2);
        assert_eq!(
            h.drain(),
            vec![
                DictationEvent::StateChanged(TurnState::Processing),
                DictationEvent::CommitText("ab".into()),
                DictationEvent::StateChanged(TurnState::Recording),
            ]
        );
    }

    #[test]
    fn test_restart_failure_while_recording_ends_session_silently() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);
        h.drain();
        h.world.lock().start_results.push_back(false);

        h.fire(ServerEvent::ResponseDone);

        assert_eq!(h.controller.state(), TurnState::Idle);
        assert_eq!(h.drain(), vec![DictationEvent::StateChanged(TurnState::Idle)]);
        assert!(!h.world.lock().connected);
    }

    #[test]
    fn test_start_is_ignored_unless_idle() {
        for state in [TurnState::Connecting, TurnState::Recording, TurnState::Processing] {
            let mut h = Harness::new();
            h.reach(state);
            let before = h.drain();

            assert!(!h.start());
            assert!(h.drain().is_empty());
            assert_eq!(h.world.lock().connects, 1);
            assert_eq!(h.controller.state(), state);
            assert!(!before.is_empty());
        }
    }

    #[test]
    fn test_user_stop_while_recording_commits_once() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);
        h.world.lock().log.clear();

        h.controller.stop();

        let world = h.world.lock();
        assert_eq!(world.log, vec!["pause", "stop", "commit"]);
        assert_eq!(world.commits, 1);
        assert!(!world.capture_running);
        drop(world);
        assert!(h.controller.pending_stop());
        assert_eq!(h.controller.state(), TurnState::Processing);
    }

    #[test]
    fn test_speech_stopped_pauses_before_stopping() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);
        h.world.lock().log.clear();

        h.fire(ServerEvent::SpeechStopped { audio_end_ms: 10 });

        assert_eq!(h.world.lock().log, vec!["pause", "stop"]);
        assert_eq!(h.world.lock().commits, 0);
        assert!(!h.controller.pending_stop());
    }

    #[test]
    fn test_cleanup_from_every_state() {
        for state in ALL_STATES {
            let mut h = Harness::new();
            h.reach(state);
            h.controller.stop();
            h.reach_cleanup_and_check();
        }

        for state in ALL_STATES {
            let mut h = Harness::new();
            h.reach(state);
            h.reach_cleanup_and_check();
            // Idempotent
            h.reach_cleanup_and_check();
        }
    }

    impl Harness {
        fn reach_cleanup_and_check(&mut self) {
            self.controller.cleanup();
            assert_eq!(self.controller.state(), TurnState::Idle);
            assert!(!self.controller.pending_stop());
            assert_eq!(self.controller.composing_text(), "");
            assert_eq!(self.controller.amplitude(), 0.0);
            let world = self.world.lock();
            assert!(!world.capture_running);
            assert!(!world.connected);
        }
    }

    #[test]
    fn test_scenario_b_stop_before_speech() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);

        h.controller.stop();
        assert_eq!(h.controller.state(), TurnState::Processing);
        assert_eq!(h.world.lock().commits, 1);

        h.fire(ServerEvent::ResponseDone);
        assert_eq!(h.controller.state(), TurnState::Idle);
        assert!(!h.world.lock().connected);
        assert_eq!(h.world.lock().disconnects, 1);
        assert_eq!(h.world.lock().capture_starts, 1);
        assert_eq!(
            state_changes(&h.drain()).last(),
            Some(&TurnState::Idle)
        );
    }

    #[test]
    fn test_second_stop_while_processing_only_marks_pending() {
        let mut h = Harness::new();
        h.reach(TurnState::Processing);
        h.drain();

        h.controller.stop();
        assert!(h.controller.pending_stop());
        assert_eq!(h.controller.state(), TurnState::Processing);
        assert_eq!(h.world.lock().commits, 0);
        assert!(h.drain().is_empty());

        h.controller.stop();
        assert_eq!(h.world.lock().commits, 0);

        h.fire(ServerEvent::TextDone("done".into()));
        h.fire(ServerEvent::ResponseDone);
        assert_eq!(h.controller.state(), TurnState::Idle);
        assert_eq!(
            h.drain(),
            vec![
                DictationEvent::CommitText("done".into()),
                DictationEvent::StateChanged(TurnState::Idle),
            ]
        );
    }

    #[test]
    fn test_scenario_c_error_from_any_active_state() {
        for state in [TurnState::Connecting, TurnState::Recording, TurnState::Processing] {
            let mut h = Harness::new();
            h.reach(state);
            h.drain();

            h.fire(ServerEvent::Error("x".into()));

            assert_eq!(
                h.drain(),
                vec![
                    DictationEvent::Error("x".into()),
                    DictationEvent::StateChanged(TurnState::Idle),
                ]
            );
            assert!(!h.world.lock().connected);
            assert!(!h.world.lock().capture_running);

            assert!(h.start());
            assert_eq!(h.controller.state(), TurnState::Connecting);
            assert_eq!(h.world.lock().connects, 2);
        }
    }

    #[test]
    fn test_scenario_d_two_cycles_do_not_share_text() {
        let mut h = Harness::new();
        h.reach(TurnState::Recording);
        h.drain();

        for (deltas, done) in [(["He", "llo"], "Hello"), (["wor", "ld"], "world")] {
            h.fire(ServerEvent::SpeechStopped { audio_end_ms: 0 });
            for delta in deltas {
                h.fire(ServerEvent::TextDelta(delta.into()));
            }
            h.fire(ServerEvent::TextDone(done.into()));
            h.fire(ServerEvent::ResponseDone);
        }

        let texts: Vec<_> = h
            .drain()
            .into_iter()
            .filter(|e| !matches!(e, DictationEvent::StateChanged(_)))
            .collect();
        assert_eq!(
            texts,
            vec![
                DictationEvent::ComposingText("He".into()),
                DictationEvent::ComposingText("Hello".into()),
                DictationEvent::CommitText("Hello".into()),
                DictationEvent::ComposingText("wor".into()),
                DictationEvent::ComposingText("world".into()),
                DictationEvent::CommitText("world".into()),
            ]
        );
        assert_eq!(h.controller.state(), TurnState::Recording);
        assert_eq!(h.world.lock().capture_starts, 3);
    }

    #[test]
    fn test_capture_failure_on_session_ready_is_surfaced() {
        let mut h = Harness::new();
        h.world.lock().start_results.push_back(false);
        h.start();
        h.drain();

        h.fire(ServerEvent::SessionReady);

        let events = h.drain();
        assert!(matches!(events[0], DictationEvent::Error(_)));
        assert_eq!(events[1], DictationEvent::StateChanged(TurnState::Idle));
        assert_eq!(events.len(), 2);
        assert!(!h.world.lock().connected);
    }

    #[test]
    fn test_capture_restart_failure_ends_session_silently() {
        let mut h = Harness::new();
        h.reach(TurnState::Processing);
        h.drain();
        h.world.lock().start_results.push_back(false);

        h.fire(ServerEvent::ResponseDone);

        assert_eq!(h.controller.state(), TurnState::Idle);
        assert_eq!(h.drain(), vec![DictationEvent::StateChanged(TurnState::Idle)]);
        assert!(!h.world.lock().connected);
    }

    #[test]
    fn test_stop_while_connecting_cleans_up() {
        let mut h = Harness::new();
        h.reach(TurnState::Connecting);

        h.controller.stop();

        assert_eq!(h.controller.state(), TurnState::Idle);
        assert_eq!(h.world.lock().commits, 0);
        assert!(!h.world.lock().connected);
    }

    #[test]
    fn test_events_from_previous_session_are_dropped() {
        let mut h = Harness::new();
        h.reach(TurnState::Connecting);
        let stale = h.world.lock().handler.clone().unwrap();
        h.controller.cleanup();

        h.start();
        h.drain();
        stale(ServerEvent::SessionReady);
        stale(ServerEvent::Error("old".into()));
        h.pump();

        assert_eq!(h.controller.state(), TurnState::Connecting);
        assert!(h.drain().is_empty());
    }

    #[test]
    fn test_ignores_out_of_place_events() {
        let mut h = Harness::new();
        h.reach(TurnState::Connecting);
        h.drain();

        h.fire(ServerEvent::TextDelta("early".into()));
        h.fire(ServerEvent::ResponseDone);
        h.fire(ServerEvent::SpeechStopped { audio_end_ms: 0 });
        h.fire(ServerEvent::TranscriptionCompleted("t".into()));
        assert_eq!(h.controller.state(), TurnState::Connecting);
        assert!(h.drain().is_empty());

        h.fire(ServerEvent::SessionReady);
        h.fire(ServerEvent::SessionReady);
        assert_eq!(h.world.lock().capture_starts, 1);
        assert!(h.controller.amplitude() > 0.0);
    }

    #[derive(Debug, Clone)]
    enum TextOp {
        Delta(String),
        Done,
    }

    fn text_op() -> impl Strategy<Value = TextOp> {
        prop_oneof![
            4 => "[a-z ]{0,6}".prop_map(TextOp::Delta),
            1 => Just(TextOp::Done),
        ]
    }

    proptest! {
        #[test]
        fn prop_composing_is_concatenation_since_last_done(ops in prop::collection::vec(text_op(), 0..40)) {
            let mut h = Harness::new();
            h.reach(TurnState::Recording);
            h.drain();

            let mut expected = String::new();
            for op in ops {
                match op {
                    TextOp::Delta(delta) => {
                        expected.push_str(&delta);
                        h.fire(ServerEvent::TextDelta(delta));
                        prop_assert_eq!(
                            h.drain(),
                            vec![DictationEvent::ComposingText(expected.clone())]
                        );
                    }
                    TextOp::Done => {
                        h.fire(ServerEvent::TextDone(expected.clone()));
                        prop_assert_eq!(
                            h.drain(),
                            vec![DictationEvent::CommitText(expected.clone())]
                        );
                        expected.clear();
                    }
                }
                prop_assert_eq!(h.controller.composing_text(), expected.clone());
            }
        }
    }
}
