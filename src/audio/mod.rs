//! Audio concealment module
//!
//! Handles packet containers, the cosine transform, boundary smoothing,
//! concealment strategies, the receiver state machine, and output sinks.

mod error;
mod packet;
mod receiver;
mod samples;
mod sink;
mod smoother;
mod strategy;
mod transform;
mod wav;

pub use error::ConcealError;
pub use packet::{
    Packet, SmoothingWindow, HALF_PACKET, JUNCTION_SAMPLES, PACKET_BYTES, PACKET_SAMPLES,
    SAMPLE_BYTES, WINDOW_SAMPLES,
};
pub use receiver::{ArrivalOutcome, Receiver, ReceiverState, ReceiverStats};
pub use samples::{copy_range, crossfade, saturate, silence};
pub use sink::{Amendment, MemorySink, OutputSink, PcmWriter};
pub use smoother::{BoundarySmoother, LOW_PASS_CUTOFF};
pub use strategy::{ConcealmentStrategy, FillOutcome, Gap, GapFiller};
pub use transform::{CosineTransform, DirectDct};
pub use wav::{decode_raw, is_wav_path, read_wav, write_wav, WavError};
