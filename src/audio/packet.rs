//! Fixed-size PCM containers
//!
//! A [`Packet`] is always exactly [`PACKET_SAMPLES`] samples, and a
//! [`SmoothingWindow`] always exactly [`WINDOW_SAMPLES`]. Construction from
//! untrusted input goes through checked constructors.

use super::error::ConcealError;
use super::samples::copy_range;

/// Samples per packet
pub const PACKET_SAMPLES: usize = 320;

/// Bytes per 16-bit sample
pub const SAMPLE_BYTES: usize = 2;

/// Bytes per packet payload
pub const PACKET_BYTES: usize = PACKET_SAMPLES * SAMPLE_BYTES;

/// Half a packet
pub const HALF_PACKET: usize = PACKET_SAMPLES / 2;

/// Samples taken from each side of a junction
pub const JUNCTION_SAMPLES: usize = 80;

/// Samples in a smoothing window (both sides of a junction)
pub const WINDOW_SAMPLES: usize = 2 * JUNCTION_SAMPLES;

/// One packet of mono 16-bit PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    samples: [i16; PACKET_SAMPLES],
}

impl Packet {
    /// An all-zero packet
    pub fn silent() -> Self {
        Self {
            samples: [0; PACKET_SAMPLES],
        }
    }

    /// Build a packet from exactly [`PACKET_SAMPLES`] samples
    pub fn from_samples(samples: &[i16]) -> Result<Self, ConcealError> {
        if samples.len() != PACKET_SAMPLES {
            return Err(ConcealError::PacketLength {
                expected: PACKET_SAMPLES,
                actual: samples.len(),
            });
        }

        let mut packet = Self::silent();
        packet.samples.copy_from_slice(samples);
        Ok(packet)
    }

    /// Decode a little-endian PCM payload
    pub fn from_le_bytes(data: &[u8]) -> Result<Self, ConcealError> {
        if data.len() % SAMPLE_BYTES != 0 {
            return Err(ConcealError::OddPayloadLength(data.len()));
        }
        if data.len() != PACKET_BYTES {
            return Err(ConcealError::PacketLength {
                expected: PACKET_SAMPLES,
                actual: data.len() / SAMPLE_BYTES,
            });
        }

        let mut packet = Self::silent();
        for (sample, bytes) in packet.samples.iter_mut().zip(data.chunks_exact(SAMPLE_BYTES)) {
            *sample = i16::from_le_bytes([bytes[0], bytes[1]]);
        }
        Ok(packet)
    }

    /// Encode as a little-endian PCM payload
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Second half of `first` followed by the first half of `second`
    pub fn bridge(first: &Packet, second: &Packet) -> Result<Self, ConcealError> {
        let mut packet = Self::silent();
        copy_range(&mut packet.samples, &first.samples, 0, HALF_PACKET, HALF_PACKET)?;
        copy_range(&mut packet.samples, &second.samples, HALF_PACKET, 0, HALF_PACKET)?;
        Ok(packet)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    pub fn is_silent(&self) -> bool {
        self.samples.iter().all(|&s| s == 0)
    }
}

impl Default for Packet {
    fn default() -> Self {
        Self::silent()
    }
}

/// The transient buffer the boundary smoother filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothingWindow {
    samples: [i16; WINDOW_SAMPLES],
}

impl SmoothingWindow {
    /// Tail of `prev` followed by the head of `next`
    pub fn junction(prev: &Packet, next: &Packet) -> Result<Self, ConcealError> {
        let mut samples = [0; WINDOW_SAMPLES];
        copy_range(
            &mut samples,
            prev.samples(),
            0,
            PACKET_SAMPLES - JUNCTION_SAMPLES,
            JUNCTION_SAMPLES,
        )?;
        copy_range(&mut samples, next.samples(), JUNCTION_SAMPLES, 0, JUNCTION_SAMPLES)?;
        Ok(Self { samples })
    }

    /// The window starting at `offset` inside a single packet
    pub fn within(packet: &Packet, offset: usize) -> Result<Self, ConcealError> {
        let mut samples = [0; WINDOW_SAMPLES];
        copy_range(&mut samples, packet.samples(), 0, offset, WINDOW_SAMPLES)?;
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}
