//! End-to-end loss simulation
//!
//! Packetizes a PCM signal, sends it through a [`LossyChannel`] as datagrams,
//! and feeds whatever survives to a concealing [`Receiver`].

use serde::Serialize;
use tracing::{info, warn};

use super::channel::{ChannelStats, LossyChannel};
use crate::audio::{
    ConcealError, OutputSink, Packet, Receiver, ReceiverStats, PACKET_SAMPLES,
};
use crate::config::SessionConfig;
use crate::protocol::{AudioDatagram, ProtocolError};

/// Errors during a simulation run
#[derive(thiserror::Error, Debug)]
pub enum SimulationError {
    #[error("Concealment failed: {0}")]
    Conceal(#[from] ConcealError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Summary of a simulation run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub packets_sent: u64,
    pub channel: ChannelStats,
    pub receiver: ReceiverStats,
}

/// Split samples into packets, zero-padding the last one
pub fn packetize(samples: &[i16]) -> Vec<Packet> {
    samples
        .chunks(PACKET_SAMPLES)
        .map(|chunk| {
            let mut packet = Packet::silent();
            packet.samples_mut()[..chunk.len()].copy_from_slice(chunk);
            packet
        })
        .collect()
}

/// Run `samples` through a lossy channel into a receiver writing to `sink`
pub fn simulate<S: OutputSink>(
    samples: &[i16],
    config: &SessionConfig,
    sink: S,
) -> Result<(SimulationReport, S), SimulationError> {
    let packets = packetize(samples);
    let mut channel = LossyChannel::from_config(&config.loss);
    let mut receiver = Receiver::from_config(config, sink);

    info!(
        "Simulating {} packets with strategy {}",
        packets.len(),
        receiver.strategy()
    );

    for (sequence, packet) in packets.iter().enumerate() {
        let datagram = AudioDatagram::new(sequence as u32, packet.to_le_bytes());
        let wire = datagram.encode()?;

        let Some(delivered) = channel.transmit(AudioDatagram::decode(&wire)?) else {
            continue;
        };
        receiver.on_packet_arrival(delivered.sequence, &delivered.payload)?;
    }

    if channel.stats().dropped > 0 && receiver.stats().packets_received == 0 {
        warn!("Every packet was lost; output is empty");
    }

    let report = SimulationReport {
        packets_sent: packets.len() as u64,
        channel: channel.stats().clone(),
        receiver: receiver.stats().clone(),
    };
    Ok((report, receiver.into_sink()))
}
