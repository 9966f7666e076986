//! Audio subsystem module

pub mod buffer;
pub mod capture;
pub mod device;

pub use capture::{AudioCaptureStream, ChunkSink};
pub use device::{input_device, list_input_devices};
