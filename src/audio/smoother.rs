//! Spectral boundary smoothing
//!
//! Splicing two unrelated packets leaves a step at the junction that is heard
//! as a click. The smoother low-pass filters a 160-sample window straddling the
//! junction in the cosine domain, then fades from the raw signal at the far
//! edge of the earlier packet into the filtered signal at the junction.

use std::sync::Arc;

use super::error::ConcealError;
use super::packet::{Packet, SmoothingWindow, JUNCTION_SAMPLES, WINDOW_SAMPLES};
use super::samples::{copy_range, crossfade};
use super::sink::OutputSink;
use super::transform::CosineTransform;

/// First coefficient index removed by the low-pass step
pub const LOW_PASS_CUTOFF: usize = 80;

/// Offset of the centered window inside a bridge packet
const MIDPOINT_OFFSET: usize = JUNCTION_SAMPLES;

/// Removes discontinuities at packet junctions
#[derive(Clone)]
pub struct BoundarySmoother {
    transform: Arc<dyn CosineTransform>,
}

impl BoundarySmoother {
    pub fn new(transform: Arc<dyn CosineTransform>) -> Self {
        Self { transform }
    }

    /// Low-pass the window, then fade its first half from raw to filtered
    fn filter(&self, window: &SmoothingWindow) -> Result<Vec<i16>, ConcealError> {
        let mut coeffs = self.transform.forward(window.samples());
        coeffs
            .iter_mut()
            .skip(LOW_PASS_CUTOFF)
            .for_each(|c| *c = 0);

        let mut filtered = self.transform.inverse(&coeffs);
        if filtered.len() != WINDOW_SAMPLES {
            return Err(ConcealError::PacketLength {
                expected: WINDOW_SAMPLES,
                actual: filtered.len(),
            });
        }

        crossfade(&mut filtered, window.samples(), JUNCTION_SAMPLES)?;
        Ok(filtered)
    }

    /// Smooth the junction between the packet most recently written to
    /// `sink` and `incoming`, then write `incoming`
    ///
    /// Rewrites the last [`JUNCTION_SAMPLES`] samples already on the sink and
    /// the first [`JUNCTION_SAMPLES`] of `incoming` in place.
    pub fn smooth_junction(
        &self,
        written_prev: &Packet,
        incoming: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ConcealError> {
        let window = SmoothingWindow::junction(written_prev, incoming)?;
        let filtered = self.filter(&window)?;

        sink.amend_tail(&filtered[..JUNCTION_SAMPLES])?;
        copy_range(
            incoming.samples_mut(),
            &filtered,
            0,
            JUNCTION_SAMPLES,
            JUNCTION_SAMPLES,
        )?;
        sink.append(incoming.samples())
    }

    /// Smooth the splice in the middle of a bridge packet
    pub fn smooth_midpoint(&self, packet: &mut Packet) -> Result<(), ConcealError> {
        let window = SmoothingWindow::within(packet, MIDPOINT_OFFSET)?;
        let filtered = self.filter(&window)?;
        copy_range(
            packet.samples_mut(),
            &filtered,
            MIDPOINT_OFFSET,
            0,
            WINDOW_SAMPLES,
        )
    }
}
