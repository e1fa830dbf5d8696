//! Datagram format for the simulated audio transport
//!
//! Datagram format (8-byte header):
//! - version: 1 byte
//! - flags: 1 byte (reserved, zero)
//! - payload length: 2 bytes (big-endian, in bytes)
//! - sequence: 4 bytes (big-endian)
//!
//! The payload is raw little-endian 16-bit PCM.

use thiserror::Error;

/// Protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Header size in bytes
pub const HEADER_SIZE: usize = 8;

/// Errors decoding a datagram
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Datagram too short: {0} bytes")]
    TooShort(usize),

    #[error("Unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    #[error("Payload length mismatch: header says {declared}, got {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),
}

/// One audio packet on the simulated wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDatagram {
    pub sequence: u32,
    pub payload: Vec<u8>,
}

impl AudioDatagram {
    pub fn new(sequence: u32, payload: Vec<u8>) -> Self {
        Self { sequence, payload }
    }

    /// Serialize to wire bytes
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let len = u16::try_from(self.payload.len())
            .map_err(|_| ProtocolError::PayloadTooLarge(self.payload.len()))?;

        let mut buf = Vec::with_capacity(HEADER_SIZE + self.payload.len());
        buf.push(PROTOCOL_VERSION);
        buf.push(0);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.extend_from_slice(&self.sequence.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }

    /// Parse wire bytes
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < HEADER_SIZE {
            return Err(ProtocolError::TooShort(data.len()));
        }
        if data[0] != PROTOCOL_VERSION {
            return Err(ProtocolError::UnsupportedVersion(data[0]));
        }

        let declared = u16::from_be_bytes([data[2], data[3]]) as usize;
        let payload = &data[HEADER_SIZE..];
        if payload.len() != declared {
            return Err(ProtocolError::LengthMismatch {
                declared,
                actual: payload.len(),
            });
        }

        Ok(Self {
            sequence: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            payload: payload.to_vec(),
        })
    }
}
