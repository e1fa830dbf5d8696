//! Concealment error types

use thiserror::Error;

/// Errors that can occur while receiving and concealing packets
#[derive(Error, Debug)]
pub enum ConcealError {
    #[error("Payload has an odd number of bytes: {0}")]
    OddPayloadLength(usize),

    #[error("Packet length mismatch: expected {expected} samples, got {actual}")]
    PacketLength { expected: usize, actual: usize },

    #[error("Sample range out of bounds: {start}..{start}+{count} in buffer of {len}")]
    RangeOutOfBounds {
        start: usize,
        count: usize,
        len: usize,
    },

    #[error("Cannot amend {requested} samples, only {written} written")]
    AmendOutOfRange { requested: usize, written: u64 },

    #[error("Gap of {missing} packets after sequence {last} exceeds limit of {limit}")]
    GapTooLarge { last: u32, missing: u32, limit: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
