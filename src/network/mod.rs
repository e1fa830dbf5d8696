//! Simulated transport
//!
//! A lossy channel and the driver that runs a signal through it into a
//! concealing receiver. No real sockets are involved.

mod channel;
mod simulation;

pub use channel::{ChannelStats, LossyChannel};
pub use simulation::{packetize, simulate, SimulationError, SimulationReport};
