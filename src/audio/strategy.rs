//! Concealment strategies
//!
//! Each [`ConcealmentStrategy`] maps to one [`GapFiller`]. The receiver picks
//! the filler once, when the stream is configured, and calls it for every gap
//! it detects.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::ConcealError;
use super::packet::{Packet, PACKET_SAMPLES};
use super::samples::silence;
use super::sink::OutputSink;
use super::smoother::BoundarySmoother;
use super::transform::CosineTransform;

/// How missing packets are replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ConcealmentStrategy {
    /// Zero-filled packets
    Silence,
    /// The previous packet once, then silence
    RepeatPrevious,
    /// Silence, then the arriving packet in the last missing slot
    RepeatNext,
    /// Material from both sides of the gap, smoothed at every junction
    #[default]
    RepeatBoth,
    /// Packets blended from both sides in the cosine domain
    SpectralInterpolate,
}

impl ConcealmentStrategy {
    pub const ALL: [ConcealmentStrategy; 5] = [
        ConcealmentStrategy::Silence,
        ConcealmentStrategy::RepeatPrevious,
        ConcealmentStrategy::RepeatNext,
        ConcealmentStrategy::RepeatBoth,
        ConcealmentStrategy::SpectralInterpolate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConcealmentStrategy::Silence => "silence",
            ConcealmentStrategy::RepeatPrevious => "repeat-previous",
            ConcealmentStrategy::RepeatNext => "repeat-next",
            ConcealmentStrategy::RepeatBoth => "repeat-both",
            ConcealmentStrategy::SpectralInterpolate => "spectral-interpolate",
        }
    }

    /// Build the gap filler for this strategy
    pub fn filler(self, transform: Arc<dyn CosineTransform>) -> Box<dyn GapFiller> {
        match self {
            ConcealmentStrategy::Silence => Box::new(SilenceFill),
            ConcealmentStrategy::RepeatPrevious => Box::new(RepeatPreviousFill),
            ConcealmentStrategy::RepeatNext => Box::new(RepeatNextFill),
            ConcealmentStrategy::RepeatBoth => Box::new(RepeatBothFill {
                smoother: BoundarySmoother::new(transform),
            }),
            ConcealmentStrategy::SpectralInterpolate => {
                Box::new(SpectralInterpolateFill { transform })
            }
        }
    }
}

impl fmt::Display for ConcealmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConcealmentStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| format!("Unknown concealment strategy: {}", s))
    }
}

/// A detected run of missing packets
#[derive(Debug, Clone, Copy)]
pub struct Gap<'a> {
    /// Sequence number of the last packet before the gap
    pub last_seqno: u32,
    /// Sequence number of the packet that revealed the gap
    pub seqno: u32,
    /// The last packet before the gap, as committed to the sink
    pub previous: &'a Packet,
}

impl Gap<'_> {
    /// Number of missing packets
    pub fn missing(&self) -> u32 {
        self.seqno - self.last_seqno - 1
    }
}

/// What a filler did for one gap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOutcome {
    /// Packets written in place of missing ones
    pub inserted: u32,
    /// Whether the arriving packet itself was already written
    pub arrival_written: bool,
}

/// Writes replacement audio for one gap
pub trait GapFiller: Send + Sync {
    fn strategy(&self) -> ConcealmentStrategy;

    /// Fill `gap`, which ends just before `arrival`
    ///
    /// May rewrite `arrival` in place when it is smoothed against filler
    /// audio; in that case the filler also writes it.
    fn fill(
        &self,
        gap: &Gap<'_>,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError>;
}

struct SilenceFill;

impl GapFiller for SilenceFill {
    fn strategy(&self) -> ConcealmentStrategy {
        ConcealmentStrategy::Silence
    }

    fn fill(
        &self,
        gap: &Gap<'_>,
        _arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError> {
        let silent = silence(PACKET_SAMPLES);
        for _ in 0..gap.missing() {
            sink.append(&silent)?;
        }

        Ok(FillOutcome {
            inserted: gap.missing(),
            arrival_written: false,
        })
    }
}

struct RepeatPreviousFill;

impl GapFiller for RepeatPreviousFill {
    fn strategy(&self) -> ConcealmentStrategy {
        ConcealmentStrategy::RepeatPrevious
    }

    fn fill(
        &self,
        gap: &Gap<'_>,
        _arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError> {
        sink.append(gap.previous.samples())?;

        let silent = silence(PACKET_SAMPLES);
        for _ in 1..gap.missing() {
            sink.append(&silent)?;
        }

        Ok(FillOutcome {
            inserted: gap.missing(),
            arrival_written: false,
        })
    }
}

struct RepeatNextFill;

impl GapFiller for RepeatNextFill {
    fn strategy(&self) -> ConcealmentStrategy {
        ConcealmentStrategy::RepeatNext
    }

    fn fill(
        &self,
        gap: &Gap<'_>,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError> {
        let silent = silence(PACKET_SAMPLES);
        let missing = gap.missing();

        for slot in 0..missing {
            if slot + 1 == missing {
                // The arrival is heard twice: here and as itself
                sink.append(arrival.samples())?;
            } else {
                sink.append(&silent)?;
            }
        }

        Ok(FillOutcome {
            inserted: missing,
            arrival_written: false,
        })
    }
}

struct RepeatBothFill {
    smoother: BoundarySmoother,
}

impl RepeatBothFill {
    /// One missing packet: bridge the halves around it
    fn fill_single(
        &self,
        previous: &Packet,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ConcealError> {
        let mut bridge = Packet::bridge(previous, arrival)?;
        self.smoother.smooth_midpoint(&mut bridge)?;
        self.smoother.smooth_junction(previous, &mut bridge, sink)?;
        self.smoother.smooth_junction(&bridge, arrival, sink)
    }

    /// Two or more: previous, silence..., arrival, each junction smoothed
    fn fill_run(
        &self,
        previous: &Packet,
        missing: u32,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<(), ConcealError> {
        let mut written = previous.clone();
        self.smoother.smooth_junction(previous, &mut written, sink)?;

        for slot in 1..missing {
            if slot + 1 == missing {
                // The arrival fills the last slot and stays rewritten in place,
                // so its head is smoothed again below.
                self.smoother.smooth_junction(&written, arrival, sink)?;
                written = arrival.clone();
            } else {
                let mut silent = Packet::silent();
                self.smoother.smooth_junction(&written, &mut silent, sink)?;
                written = silent;
            }
        }

        self.smoother.smooth_junction(&written, arrival, sink)
    }
}

impl GapFiller for RepeatBothFill {
    fn strategy(&self) -> ConcealmentStrategy {
        ConcealmentStrategy::RepeatBoth
    }

    fn fill(
        &self,
        gap: &Gap<'_>,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError> {
        let missing = gap.missing();
        if missing == 1 {
            self.fill_single(gap.previous, arrival, sink)?;
        } else {
            self.fill_run(gap.previous, missing, arrival, sink)?;
        }

        Ok(FillOutcome {
            inserted: missing,
            arrival_written: true,
        })
    }
}

struct SpectralInterpolateFill {
    transform: Arc<dyn CosineTransform>,
}

impl GapFiller for SpectralInterpolateFill {
    fn strategy(&self) -> ConcealmentStrategy {
        ConcealmentStrategy::SpectralInterpolate
    }

    fn fill(
        &self,
        gap: &Gap<'_>,
        arrival: &mut Packet,
        sink: &mut dyn OutputSink,
    ) -> Result<FillOutcome, ConcealError> {
        let missing = gap.missing();
        let before = self.transform.forward(gap.previous.samples());
        let after = self.transform.forward(arrival.samples());

        let step = 1.0 / (missing as f32 + 1.0);
        for k in 0..missing {
            let weight = step * (k + 1) as f32;
            debug!(
                "Interpolating packet {} with weight {:.4}",
                gap.last_seqno as u64 + k as u64 + 1,
                weight
            );

            let blended: Vec<i32> = before
                .iter()
                .zip(&after)
                .map(|(&p, &a)| ((1.0 - weight) * p as f32 + weight * a as f32) as i32)
                .collect();

            let synthetic = self.transform.inverse(&blended);
            if synthetic.len() != PACKET_SAMPLES {
                return Err(ConcealError::PacketLength {
                    expected: PACKET_SAMPLES,
                    actual: synthetic.len(),
                });
            }
            // Junctions with interpolated packets are left unsmoothed
            sink.append(&synthetic)?;
        }

        Ok(FillOutcome {
            inserted: missing,
            arrival_written: false,
        })
    }
}
