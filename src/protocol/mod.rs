//! Simulated wire protocol
//!
//! Defines the datagram format carrying sequence-numbered PCM packets.

mod datagram;

pub use datagram::{AudioDatagram, ProtocolError, HEADER_SIZE, PROTOCOL_VERSION};
