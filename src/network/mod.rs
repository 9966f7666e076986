//! Network subsystem for the realtime websocket transport

pub mod client;
pub mod ws;

pub use client::{EventHandler, ProtocolClient};
