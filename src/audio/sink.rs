//! Output sinks for concealed audio
//!
//! A sink is append-only except for one capability: the samples most
//! recently committed may be amended in place. The boundary smoother uses
//! this to rewrite the tail of the previous packet.

use std::io::{Seek, SeekFrom, Write};

use super::error::ConcealError;
use super::packet::SAMPLE_BYTES;

/// Destination for 16-bit PCM output
pub trait OutputSink {
    /// Append samples to the end of the stream
    fn append(&mut self, samples: &[i16]) -> Result<(), ConcealError>;

    /// Overwrite the last `samples.len()` committed samples
    fn amend_tail(&mut self, samples: &[i16]) -> Result<(), ConcealError>;

    /// Number of samples committed so far
    fn samples_written(&self) -> u64;
}

impl<T: OutputSink + ?Sized> OutputSink for &mut T {
    fn append(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        (**self).append(samples)
    }

    fn amend_tail(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        (**self).amend_tail(samples)
    }

    fn samples_written(&self) -> u64 {
        (**self).samples_written()
    }
}

impl<T: OutputSink + ?Sized> OutputSink for Box<T> {
    fn append(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        (**self).append(samples)
    }

    fn amend_tail(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        (**self).amend_tail(samples)
    }

    fn samples_written(&self) -> u64 {
        (**self).samples_written()
    }
}

fn check_amend(requested: usize, written: u64) -> Result<(), ConcealError> {
    if requested as u64 > written {
        return Err(ConcealError::AmendOutOfRange { requested, written });
    }
    Ok(())
}

/// Region rewritten by an amend, in samples from the start of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amendment {
    pub offset: u64,
    pub len: usize,
}

/// In-memory sink that also records every amendment
#[derive(Debug, Default)]
pub struct MemorySink {
    samples: Vec<i16>,
    amendments: Vec<Amendment>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn amendments(&self) -> &[Amendment] {
        &self.amendments
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }
}

impl OutputSink for MemorySink {
    fn append(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }

    fn amend_tail(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        check_amend(samples.len(), self.samples_written())?;

        let start = self.samples.len() - samples.len();
        self.samples[start..].copy_from_slice(samples);
        self.amendments.push(Amendment {
            offset: start as u64,
            len: samples.len(),
        });
        Ok(())
    }

    fn samples_written(&self) -> u64 {
        self.samples.len() as u64
    }
}

/// Raw little-endian PCM writer over any seekable byte stream
///
/// Amending seeks back relative to the current position, overwrites, and
/// leaves the cursor at the end of the stream again.
pub struct PcmWriter<W: Write + Seek> {
    inner: W,
    written: u64,
}

impl<W: Write + Seek> PcmWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Flush and return the underlying writer
    pub fn into_inner(mut self) -> Result<W, ConcealError> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_samples(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        self.inner.write_all(&bytes)?;
        Ok(())
    }
}

impl<W: Write + Seek> OutputSink for PcmWriter<W> {
    fn append(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        self.write_samples(samples)?;
        self.written += samples.len() as u64;
        Ok(())
    }

    fn amend_tail(&mut self, samples: &[i16]) -> Result<(), ConcealError> {
        check_amend(samples.len(), self.written)?;

        let back = (samples.len() * SAMPLE_BYTES) as i64;
        self.inner.seek(SeekFrom::Current(-back))?;
        self.write_samples(samples)
    }

    fn samples_written(&self) -> u64 {
        self.written
    }
}
