//! Microphone capture
//!
//! One dedicated thread per active stream owns the cpal input stream,
//! re-slices callback data into fixed-duration PCM16 chunks and hands each
//! chunk to the sink synchronously. The live RMS level is published through
//! an atomic so any thread can read it without locking.

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::buffer::{
    create_sample_queue, f32_to_i16, pcm16_le_bytes, rms_normalized, ChunkAssembler,
    SharedSampleQueue,
};
use crate::audio::device::{input_device, negotiate_format};
use crate::config::CaptureConfig;
use crate::constants::{DEFAULT_CHANNELS, DEVICE_INIT_TIMEOUT_MS, SAMPLE_QUEUE_CAPACITY};
use crate::error::AudioError;
use crate::protocol::CaptureState;

/// Receives each PCM16LE chunk on the capture thread
pub type ChunkSink = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Capture stream for the configured input device
pub struct AudioCaptureStream {
    config: CaptureConfig,
    sink: ChunkSink,

    /// Cleared by `pause_streaming()` and `stop()`. Replaced on every start
    /// so a detached thread only ever observes its own cleared flag.
    active: Arc<AtomicBool>,

    /// f32 bits of the last chunk's RMS
    amplitude: Arc<AtomicU32>,

    state: CaptureState,
    queue: SharedSampleQueue,
    thread_handle: Option<JoinHandle<()>>,

    /// Signalled when the capture thread has released the device
    done_rx: Option<Receiver<()>>,
}

/// Sends on drop so `stop()` learns about thread exit even after a panic
struct DoneSignal(Sender<()>);

impl Drop for DoneSignal {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

impl AudioCaptureStream {
    pub fn new(config: CaptureConfig, sink: ChunkSink) -> Self {
        Self {
            config,
            sink,
            active: Arc::new(AtomicBool::new(false)),
            amplitude: Arc::new(AtomicU32::new(0f32.to_bits())),
            state: CaptureState::Idle,
            queue: create_sample_queue(SAMPLE_QUEUE_CAPACITY),
            thread_handle: None,
            done_rx: None,
        }
    }

    /// Open the device and launch the capture loop.
    ///
    /// Returns false if already capturing or the device cannot be brought
    /// up; the reason is logged.
    pub fn start(&mut self) -> bool {
        if self.state == CaptureState::Capturing {
            tracing::warn!("Capture start ignored: already capturing");
            return false;
        }

        match self.try_start() {
            Ok(()) => {
                self.state = CaptureState::Capturing;
                tracing::info!(
                    "Audio capture started ({} Hz, {} ms chunks)",
                    self.config.sample_rate,
                    self.config.chunk_ms
                );
                true
            }
            Err(e) => {
                tracing::warn!("Audio capture failed to start: {}", e);
                self.active.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    fn try_start(&mut self) -> Result<(), AudioError> {
        let device = input_device(self.config.device.as_deref())?;
        let format = negotiate_format(&device, self.config.sample_rate, DEFAULT_CHANNELS)?;

        let stream_config = StreamConfig {
            channels: DEFAULT_CHANNELS,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let (ready_tx, ready_rx) = bounded::<Result<(), AudioError>>(1);
        let (done_tx, done_rx) = bounded::<()>(1);
        let (error_tx, error_rx) = bounded::<AudioError>(16);

        let (active, queue) = self.arm();
        let amplitude = self.amplitude.clone();
        let sink = self.sink.clone();
        let chunk_samples = self.config.chunk_samples();

        let handle = thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let _done = DoneSignal(done_tx);

                let stream = match build_stream(&device, &stream_config, format, queue.clone(), error_tx)
                    .and_then(|stream| {
                        stream
                            .play()
                            .map_err(|e| AudioError::StreamError(e.to_string()))?;
                        Ok(stream)
                    }) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));

                run_capture_loop(&active, &queue, &error_rx, chunk_samples, &sink, &amplitude);

                // Dropping the stream releases the device
                drop(stream);
                amplitude.store(0f32.to_bits(), Ordering::Relaxed);
                tracing::debug!("Capture thread exiting");
            })
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        match ready_rx.recv_timeout(Duration::from_millis(DEVICE_INIT_TIMEOUT_MS)) {
            Ok(Ok(())) => {
                self.thread_handle = Some(handle);
                self.done_rx = Some(done_rx);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(RecvTimeoutError::Timeout) => {
                // Thread exits on its own once it sees the flag
                self.active.store(false, Ordering::SeqCst);
                Err(AudioError::InitTimeout)
            }
            Err(RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                Err(AudioError::StreamError("capture thread exited".to_string()))
            }
        }
    }

    /// Fresh run flag and queue for a new capture thread
    fn arm(&mut self) -> (Arc<AtomicBool>, SharedSampleQueue) {
        self.active.store(false, Ordering::SeqCst);
        self.active = Arc::new(AtomicBool::new(true));
        self.queue = create_sample_queue(SAMPLE_QUEUE_CAPACITY);
        self.amplitude.store(0f32.to_bits(), Ordering::Relaxed);
        (self.active.clone(), self.queue.clone())
    }

    /// Stop feeding the sink. Never blocks; safe from any thread.
    pub fn pause_streaming(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Stop capture and release the device, waiting up to the configured
    /// timeout for the capture thread. Idempotent.
    pub fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);

        if let Some(handle) = self.thread_handle.take() {
            let timeout = Duration::from_millis(self.config.stop_timeout_ms);
            let exited = match self.done_rx.take() {
                Some(done_rx) => !matches!(
                    done_rx.recv_timeout(timeout),
                    Err(RecvTimeoutError::Timeout)
                ),
                None => true,
            };

            if exited {
                let _ = handle.join();
                tracing::info!(
                    "Audio capture stopped ({} blocks dropped)",
                    self.overflow_count()
                );
            } else {
                tracing::warn!(
                    "Capture thread did not exit within {:?}; detaching",
                    timeout
                );
            }
        }

        self.state = CaptureState::Idle;
        self.amplitude.store(0f32.to_bits(), Ordering::Relaxed);
    }

    /// Last chunk's normalized RMS in [0, 1]
    pub fn amplitude(&self) -> f32 {
        f32::from_bits(self.amplitude.load(Ordering::Relaxed))
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Blocks dropped because the capture loop fell behind
    pub fn overflow_count(&self) -> usize {
        self.queue.overflow_count()
    }
}

impl Drop for AudioCaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    format: SampleFormat,
    queue: SharedSampleQueue,
    error_tx: Sender<AudioError>,
) -> Result<cpal::Stream, AudioError> {
    let on_error = move |err: cpal::StreamError| {
        let _ = error_tx.try_send(AudioError::StreamError(err.to_string()));
    };

    let stream = match format {
        SampleFormat::I16 => device.build_input_stream(
            config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let _ = queue.push(data.to_vec());
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let _ = queue.push(data.iter().copied().map(f32_to_i16).collect());
            },
            on_error,
            None,
        ),
        other => {
            return Err(AudioError::UnsupportedFormat(format!("{:?}", other)));
        }
    };

    stream.map_err(|e| AudioError::StreamError(e.to_string()))
}

/// Drain the queue into fixed-size chunks until `active` is cleared or the
/// device reports an error.
///
/// The flag is checked before every sink call so no chunk is delivered
/// after `pause_streaming()` returns on another thread's view. Samples still
/// queued or partially assembled at that point are dropped, so the tail of
/// an utterance shorter than one chunk never reaches the sink.
pub(crate) fn run_capture_loop(
    active: &AtomicBool,
    queue: &SharedSampleQueue,
    errors: &Receiver<AudioError>,
    chunk_samples: usize,
    sink: &ChunkSink,
    amplitude: &AtomicU32,
) {
    let mut assembler = ChunkAssembler::new(chunk_samples);

    'capture: while active.load(Ordering::Relaxed) {
        if let Ok(e) = errors.try_recv() {
            tracing::error!("Input stream failed: {}", e);
            active.store(false, Ordering::SeqCst);
            break;
        }

        let Some(block) = queue.pop() else {
            thread::sleep(Duration::from_millis(10));
            continue;
        };

        for chunk in assembler.push(&block) {
            if !active.load(Ordering::SeqCst) {
                break 'capture;
            }
            sink(&pcm16_le_bytes(&chunk));
            amplitude.store(rms_normalized(&chunk).to_bits(), Ordering::Relaxed);
        }
    }
}
