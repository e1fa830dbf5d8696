//! Simulated lossy channel
//!
//! Drops datagrams either because their sequence number is on an explicit
//! drop list or by an independent coin flip per datagram. The RNG is seeded
//! so runs can be reproduced.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::config::LossConfig;
use crate::protocol::AudioDatagram;

/// Channel counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStats {
    pub sent: u64,
    pub dropped: u64,
}

impl ChannelStats {
    /// Fraction of datagrams dropped (0.0 - 1.0)
    pub fn loss_rate(&self) -> f32 {
        if self.sent == 0 {
            0.0
        } else {
            self.dropped as f32 / self.sent as f32
        }
    }
}

/// A one-way channel that loses datagrams
pub struct LossyChannel {
    rate: f64,
    drop: BTreeSet<u32>,
    rng: StdRng,
    stats: ChannelStats,
}

impl LossyChannel {
    /// A channel that never drops anything
    pub fn lossless() -> Self {
        Self::with_rate(0.0, Some(0))
    }

    /// Drop each datagram with probability `rate`
    pub fn with_rate(rate: f64, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            rate: rate.clamp(0.0, 1.0),
            drop: BTreeSet::new(),
            rng,
            stats: ChannelStats::default(),
        }
    }

    pub fn from_config(config: &LossConfig) -> Self {
        Self::with_rate(config.rate, config.seed).dropping(config.drop.iter().copied())
    }

    /// Always drop these sequence numbers
    pub fn dropping(mut self, sequences: impl IntoIterator<Item = u32>) -> Self {
        self.drop.extend(sequences);
        self
    }

    /// Pass a datagram through the channel, returning it if it survives
    pub fn transmit(&mut self, datagram: AudioDatagram) -> Option<AudioDatagram> {
        self.stats.sent += 1;

        let lost = self.drop.contains(&datagram.sequence)
            || (self.rate > 0.0 && self.rng.gen_bool(self.rate));
        if lost {
            debug!("Channel dropped datagram seq={}", datagram.sequence);
            self.stats.dropped += 1;
            return None;
        }

        Some(datagram)
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_all(channel: &mut LossyChannel, count: u32) -> Vec<u32> {
        (0..count)
            .filter_map(|seq| channel.transmit(AudioDatagram::new(seq, vec![])))
            .map(|d| d.sequence)
            .collect()
    }

    #[test]
    fn test_lossless_channel() {
        let mut channel = LossyChannel::lossless();
        assert_eq!(send_all(&mut channel, 10), (0..10).collect::<Vec<_>>());
        assert_eq!(channel.stats().dropped, 0);
        assert_eq!(channel.stats().loss_rate(), 0.0);
    }

    #[test]
    fn test_explicit_drops() {
        let mut channel = LossyChannel::lossless().dropping([2, 3, 7]);
        assert_eq!(send_all(&mut channel, 9), vec![0, 1, 4, 5, 6, 8]);
        assert_eq!(channel.stats().sent, 9);
        assert_eq!(channel.stats().dropped, 3);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = LossyChannel::with_rate(0.3, Some(1234));
        let mut b = LossyChannel::with_rate(0.3, Some(1234));
        assert_eq!(send_all(&mut a, 200), send_all(&mut b, 200));
    }

    #[test]
    fn test_rate_is_roughly_honoured() {
        let mut channel = LossyChannel::with_rate(0.2, Some(99));
        send_all(&mut channel, 5000);
        let rate = channel.stats().loss_rate();
        assert!(rate > 0.15 && rate < 0.25, "observed loss rate {}", rate);
    }

    #[test]
    fn test_full_loss() {
        let mut channel = LossyChannel::with_rate(1.0, Some(5));
        assert!(send_all(&mut channel, 20).is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = LossConfig {
            rate: 0.0,
            seed: Some(3),
            drop: vec![1],
        };
        let mut channel = LossyChannel::from_config(&config);
        assert_eq!(send_all(&mut channel, 3), vec![0, 2]);
    }
}
