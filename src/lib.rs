//! plcsim - Packet loss concealment for 16-bit PCM audio streams
//!
//! This library provides the receiver side of a simulated real-time audio
//! transport: it detects gaps in packet sequence numbers and fills them so
//! the output stream stays continuous and free of clicks at packet
//! boundaries.

pub mod audio;
pub mod config;
pub mod network;
pub mod protocol;

pub use audio::{ConcealmentStrategy, Packet, Receiver};
pub use config::SessionConfig;
pub use network::LossyChannel;
pub use protocol::AudioDatagram;
