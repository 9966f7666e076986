//! Sample buffering between the device callback and the capture loop
//!
//! The cpal callback must never block, so it hands sample blocks to the
//! capture thread through a lock-free queue. The capture thread then
//! re-slices them into fixed-size chunks.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Lock-free queue of PCM16 sample blocks
pub struct SampleQueue {
    queue: ArrayQueue<Vec<i16>>,
    overflow_count: AtomicUsize,
}

impl SampleQueue {
    /// Create a new queue holding up to `capacity` blocks
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            overflow_count: AtomicUsize::new(0),
        }
    }

    /// Push a block; returns false (and counts an overflow) when full
    pub fn push(&self, block: Vec<i16>) -> bool {
        match self.queue.push(block) {
            Ok(()) => true,
            Err(_) => {
                self.overflow_count.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn pop(&self) -> Option<Vec<i16>> {
        self.queue.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }
}

/// Thread-safe handle to a sample queue
pub type SharedSampleQueue = Arc<SampleQueue>;

pub fn create_sample_queue(capacity: usize) -> SharedSampleQueue {
    Arc::new(SampleQueue::new(capacity))
}

/// Re-slices arbitrary sample blocks into fixed-size chunks
pub struct ChunkAssembler {
    chunk_samples: usize,
    pending: Vec<i16>,
}

impl ChunkAssembler {
    pub fn new(chunk_samples: usize) -> Self {
        Self {
            chunk_samples,
            pending: Vec::with_capacity(chunk_samples * 2),
        }
    }

    /// Append samples and drain every complete chunk, oldest first
    pub fn push(&mut self, samples: &[i16]) -> Vec<Vec<i16>> {
        self.pending.extend_from_slice(samples);

        let mut chunks = Vec::new();
        while self.pending.len() >= self.chunk_samples {
            chunks.push(self.pending.drain(..self.chunk_samples).collect());
        }
        chunks
    }

    /// Samples waiting for a full chunk
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Convert an f32 sample in [-1, 1] to i16
pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Serialize samples as 16-bit signed little-endian PCM
pub fn pcm16_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

/// Root-mean-square level normalized to [0, 1]
pub fn rms_normalized(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let v = s as f64 / i16::MAX as f64;
            v * v
        })
        .sum();

    ((sum_sq / samples.len() as f64).sqrt() as f32).clamp(0.0, 1.0)
}
