//! Receiver state machine
//!
//! Tracks the last accepted packet and its sequence number, detects gaps, and
//! hands them to the configured gap filler before committing each arrival.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::error::ConcealError;
use super::packet::{Packet, PACKET_SAMPLES};
use super::sink::OutputSink;
use super::strategy::{ConcealmentStrategy, Gap, GapFiller};
use super::transform::{CosineTransform, DirectDct};
use crate::config::SessionConfig;

/// What the receiver is holding on to
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReceiverState {
    /// No packet seen yet
    #[default]
    Empty,
    /// Last accepted arrival, as committed to the sink
    Tracking { seqno: u32, packet: Packet },
}

/// Result of a single arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalOutcome {
    /// First packet of the stream
    First,
    /// Directly follows the previous packet
    InOrder,
    /// Followed a gap of `missing` packets, which were concealed
    Concealed { missing: u32 },
    /// Duplicate or reordered packet, dropped without output
    Stale { last: u32 },
}

/// Reception counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReceiverStats {
    /// Arrivals accepted and written
    pub packets_received: u64,
    /// Arrivals that directly followed their predecessor
    pub packets_in_order: u64,
    /// Gaps detected
    pub gaps: u64,
    /// Packets synthesized for gaps
    pub packets_concealed: u64,
    /// Duplicate or reordered arrivals dropped
    pub packets_stale: u64,
    /// Samples committed to the sink
    pub samples_written: u64,
}

impl ReceiverStats {
    /// Fraction of the stream that had to be concealed (0.0 - 1.0)
    pub fn loss_rate(&self) -> f32 {
        let total = self.packets_received + self.packets_concealed;
        if total == 0 {
            0.0
        } else {
            self.packets_concealed as f32 / total as f32
        }
    }
}

/// Packet loss concealment receiver
///
/// Driven synchronously: each call to [`Receiver::on_packet_arrival`] writes
/// everything it produces before returning.
pub struct Receiver<S: OutputSink> {
    sink: S,
    filler: Box<dyn GapFiller>,
    state: ReceiverState,
    stats: ReceiverStats,
    max_gap: Option<u32>,
}

impl<S: OutputSink> Receiver<S> {
    /// Create a receiver with the default transform
    pub fn new(strategy: ConcealmentStrategy, sink: S) -> Self {
        Self::with_transform(strategy, sink, Arc::new(DirectDct::new()))
    }

    /// Create a receiver with a specific transform
    pub fn with_transform(
        strategy: ConcealmentStrategy,
        sink: S,
        transform: Arc<dyn CosineTransform>,
    ) -> Self {
        Self {
            sink,
            filler: strategy.filler(transform),
            state: ReceiverState::Empty,
            stats: ReceiverStats::default(),
            max_gap: None,
        }
    }

    /// Create a receiver from session configuration
    pub fn from_config(config: &SessionConfig, sink: S) -> Self {
        let mut receiver = Self::new(config.strategy, sink);
        receiver.max_gap = config.max_gap;
        receiver
    }

    /// Reject gaps longer than `limit` packets
    pub fn with_max_gap(mut self, limit: u32) -> Self {
        self.max_gap = Some(limit);
        self
    }

    /// Handle one arrival carrying little-endian PCM
    pub fn on_packet_arrival(
        &mut self,
        seqno: u32,
        data: &[u8],
    ) -> Result<ArrivalOutcome, ConcealError> {
        let packet = Packet::from_le_bytes(data)?;
        self.receive(seqno, packet)
    }

    /// Handle one already-decoded arrival
    pub fn receive(
        &mut self,
        seqno: u32,
        mut packet: Packet,
    ) -> Result<ArrivalOutcome, ConcealError> {
        debug!("Packet arrival: seqno={}", seqno);

        let outcome = match &self.state {
            ReceiverState::Empty => {
                self.sink.append(packet.samples())?;
                ArrivalOutcome::First
            }
            ReceiverState::Tracking {
                seqno: last,
                packet: previous,
            } => {
                let last = *last;
                if seqno <= last {
                    warn!(
                        "Dropping stale packet: seqno={} (last accepted {})",
                        seqno, last
                    );
                    self.stats.packets_stale += 1;
                    return Ok(ArrivalOutcome::Stale { last });
                }

                if seqno == last + 1 {
                    self.sink.append(packet.samples())?;
                    ArrivalOutcome::InOrder
                } else {
                    let gap = Gap {
                        last_seqno: last,
                        seqno,
                        previous,
                    };
                    let missing = gap.missing();
                    if let Some(limit) = self.max_gap {
                        if missing > limit {
                            return Err(ConcealError::GapTooLarge {
                                last,
                                missing,
                                limit,
                            });
                        }
                    }

                    info!(
                        "Concealing {} lost packet(s) before seqno={} with {}",
                        missing,
                        seqno,
                        self.filler.strategy()
                    );
                    let fill = self.filler.fill(&gap, &mut packet, &mut self.sink)?;
                    if !fill.arrival_written {
                        self.sink.append(packet.samples())?;
                    }

                    self.stats.gaps += 1;
                    self.stats.packets_concealed += fill.inserted as u64;
                    ArrivalOutcome::Concealed {
                        missing: fill.inserted,
                    }
                }
            }
        };

        if outcome == ArrivalOutcome::InOrder {
            self.stats.packets_in_order += 1;
        }
        self.stats.packets_received += 1;
        self.stats.samples_written = self.sink.samples_written();
        self.state = ReceiverState::Tracking { seqno, packet };

        Ok(outcome)
    }

    /// Forget the tracked packet; the next arrival starts a new stream
    pub fn reset(&mut self) {
        self.state = ReceiverState::Empty;
    }

    pub fn strategy(&self) -> ConcealmentStrategy {
        self.filler.strategy()
    }

    pub fn state(&self) -> &ReceiverState {
        &self.state
    }

    /// Sequence number of the last accepted arrival
    pub fn last_seqno(&self) -> Option<u32> {
        match &self.state {
            ReceiverState::Empty => None,
            ReceiverState::Tracking { seqno, .. } => Some(*seqno),
        }
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Packets committed so far, counting partial output as a whole packet
    pub fn packets_written(&self) -> u64 {
        self.sink.samples_written().div_ceil(PACKET_SAMPLES as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::packet::PACKET_BYTES;
    use crate::audio::sink::MemorySink;

    fn constant(value: i16) -> Packet {
        Packet::from_samples(&[value; PACKET_SAMPLES]).unwrap()
    }

    fn receiver(strategy: ConcealmentStrategy) -> Receiver<MemorySink> {
        Receiver::new(strategy, MemorySink::new())
    }

    #[test]
    fn test_first_arrival() {
        let mut rx = receiver(ConcealmentStrategy::Silence);
        assert_eq!(rx.last_seqno(), None);

        let outcome = rx.receive(5, constant(1)).unwrap();

        assert_eq!(outcome, ArrivalOutcome::First);
        assert_eq!(rx.last_seqno(), Some(5));
        assert_eq!(rx.sink().samples().len(), PACKET_SAMPLES);
    }

    #[test]
    fn test_in_order_arrivals_are_appended() {
        let mut rx = receiver(ConcealmentStrategy::RepeatBoth);
        rx.receive(0, constant(1)).unwrap();
        let outcome = rx.receive(1, constant(2)).unwrap();

        assert_eq!(outcome, ArrivalOutcome::InOrder);
        assert_eq!(rx.packets_written(), 2);
        assert!(rx.sink().amendments().is_empty());
        assert_eq!(rx.stats().packets_in_order, 1);
    }

    #[test]
    fn test_gap_is_concealed() {
        let mut rx = receiver(ConcealmentStrategy::Silence);
        rx.receive(0, constant(7)).unwrap();
        let outcome = rx.receive(3, constant(9)).unwrap();

        assert_eq!(outcome, ArrivalOutcome::Concealed { missing: 2 });
        assert_eq!(rx.packets_written(), 4);
        assert_eq!(rx.stats().gaps, 1);
        assert_eq!(rx.stats().packets_concealed, 2);
        assert!(rx.sink().samples()[3 * PACKET_SAMPLES..].iter().all(|&s| s == 9));
    }

    #[test]
    fn test_stale_arrival_dropped() {
        let mut rx = receiver(ConcealmentStrategy::RepeatPrevious);
        rx.receive(4, constant(1)).unwrap();

        assert_eq!(
            rx.receive(4, constant(2)).unwrap(),
            ArrivalOutcome::Stale { last: 4 }
        );
        assert_eq!(
            rx.receive(2, constant(3)).unwrap(),
            ArrivalOutcome::Stale { last: 4 }
        );

        assert_eq!(rx.packets_written(), 1);
        assert_eq!(rx.stats().packets_stale, 2);
        assert_eq!(
            rx.state(),
            &ReceiverState::Tracking {
                seqno: 4,
                packet: constant(1)
            }
        );
    }

    #[test]
    fn test_state_holds_committed_arrival() {
        let mut rx = receiver(ConcealmentStrategy::RepeatBoth);
        rx.receive(0, constant(3000)).unwrap();
        rx.receive(2, constant(-3000)).unwrap();

        let ReceiverState::Tracking { seqno, packet } = rx.state() else {
            panic!("receiver should be tracking");
        };
        assert_eq!(*seqno, 2);
        assert_eq!(packet.samples(), &rx.sink().samples()[2 * PACKET_SAMPLES..]);
    }

    #[test]
    fn test_wrong_payload_length_leaves_state() {
        let mut rx = receiver(ConcealmentStrategy::Silence);
        rx.on_packet_arrival(0, &[0u8; PACKET_BYTES]).unwrap();

        assert!(rx.on_packet_arrival(1, &[0u8; 100]).is_err());
        assert!(rx.on_packet_arrival(1, &[0u8; 641]).is_err());
        assert_eq!(rx.last_seqno(), Some(0));
        assert_eq!(rx.packets_written(), 1);
    }

    #[test]
    fn test_max_gap_rejects_before_writing() {
        let mut rx = receiver(ConcealmentStrategy::Silence).with_max_gap(4);
        rx.receive(0, constant(1)).unwrap();

        let err = rx.receive(10, constant(1)).unwrap_err();
        assert!(matches!(
            err,
            ConcealError::GapTooLarge {
                last: 0,
                missing: 9,
                limit: 4
            }
        ));
        assert_eq!(rx.packets_written(), 1);
        assert_eq!(rx.last_seqno(), Some(0));

        assert!(rx.receive(5, constant(1)).is_ok());
        assert_eq!(rx.packets_written(), 6);
    }

    #[test]
    fn test_reset_starts_new_stream() {
        let mut rx = receiver(ConcealmentStrategy::Silence);
        rx.receive(10, constant(1)).unwrap();
        rx.reset();

        assert_eq!(rx.receive(0, constant(2)).unwrap(), ArrivalOutcome::First);
        assert_eq!(rx.packets_written(), 2);
    }

    #[test]
    fn test_loss_rate() {
        let mut rx = receiver(ConcealmentStrategy::Silence);
        assert_eq!(rx.stats().loss_rate(), 0.0);

        rx.receive(0, constant(1)).unwrap();
        rx.receive(2, constant(1)).unwrap();
        rx.receive(3, constant(1)).unwrap();

        assert!((rx.stats().loss_rate() - 0.25).abs() < 1e-6);
    }
}
