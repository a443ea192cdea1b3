//! Processor - inbound message decoding and record emission

use std::sync::Arc;

use async_channel::Receiver;
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{MessageHandle, OutputSink, ProcessorConfig, Record};

use crate::envelope::ChangeEnvelope;
use crate::error::ProcessorError;
use crate::metrics::ProcessorMetrics;

/// One raw inbound message plus its transport handle
pub struct InboundMessage {
    /// Message bytes as delivered by the transport
    pub raw: Bytes,

    /// Handle back to the transport message
    pub handle: Box<dyn MessageHandle>,
}

impl std::fmt::Debug for InboundMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboundMessage")
            .field("raw_len", &self.raw.len())
            .finish_non_exhaustive()
    }
}

/// Record processor
///
/// Decodes each inbound message, derives the partition, and emits a `Record`
/// carrying the raw bytes to the output sink. The sink owns the record's
/// lifecycle from then on.
pub struct Processor {
    partitions: u32,
    output: Arc<dyn OutputSink>,
    metrics: Arc<ProcessorMetrics>,
}

impl Processor {
    /// Create a new processor bound to an output sink
    pub fn new(config: &ProcessorConfig, output: Arc<dyn OutputSink>) -> Self {
        Self {
            partitions: config.partitions,
            output,
            metrics: Arc::new(ProcessorMetrics::new()),
        }
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<ProcessorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Process one inbound message
    ///
    /// An undecodable message is logged and discarded; its handle is dropped
    /// unacknowledged so the transport's redelivery owns it again.
    ///
    /// # Errors
    /// Returns the decode error for observability; the caller must not treat
    /// it as fatal.
    pub fn process(&self, msg: InboundMessage) -> Result<(), ProcessorError> {
        let InboundMessage { raw, handle } = msg;

        let envelope = match ChangeEnvelope::decode(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                self.metrics.record_decode_error();
                warn!(error = %e, "discarding undecodable change message");
                return Err(e);
            }
        };

        let partition = envelope.partition_or_derived(self.partitions);
        debug!(
            table = %envelope.table,
            event = %envelope.event_name,
            partition,
            "record processed"
        );

        let record = Record::new(envelope.table, envelope.event_name, partition, raw, handle);
        self.metrics.record_processed();
        self.output.deliver(record);
        Ok(())
    }

    /// Consume inbound messages until the channel closes
    #[instrument(name = "processor_run", skip(self, rx))]
    pub async fn run(&self, rx: Receiver<InboundMessage>) {
        while let Ok(msg) = rx.recv().await {
            let _ = self.process(msg);
        }
        info!(
            processed = self.metrics.records_processed(),
            discarded = self.metrics.decode_errors(),
            "processor input closed"
        );
    }

    /// Spawn the processor loop as a background task
    pub fn spawn(self: Arc<Self>, rx: Receiver<InboundMessage>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(rx).await;
        })
    }
}
