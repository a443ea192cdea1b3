//! # Processor
//!
//! Record processing module: decodes raw inbound change messages into
//! normalized `Record`s and hands each one to an `OutputSink`.
//!
//! Also provides inbound sources for running without external systems:
//! - `MockChangeSource`: synthetic change envelopes at a configurable rate
//! - `ReplayChangeSource`: change envelopes replayed from a JSONL file

mod envelope;
mod error;
mod metrics;
mod mock;
mod partition;
mod processor;
mod replay;

pub use envelope::ChangeEnvelope;
pub use error::ProcessorError;
pub use metrics::{MetricsSnapshot, ProcessorMetrics};
pub use mock::{HandleStats, MockChangeSource, TrackingHandle};
pub use partition::{fnv1a_32, partition_for};
pub use processor::{InboundMessage, Processor};
pub use replay::ReplayChangeSource;

/// Sender side of the inbound message queue
pub type InboundSender = async_channel::Sender<InboundMessage>;

/// Receiver side of the inbound message queue
pub type InboundReceiver = async_channel::Receiver<InboundMessage>;

/// Bounded queue carrying inbound messages from sources to the processor
pub fn inbound_channel(capacity: usize) -> (InboundSender, InboundReceiver) {
    async_channel::bounded(capacity)
}
