//! Processor metrics

use std::sync::atomic::{AtomicU64, Ordering};

/// Processor counters
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    /// Records decoded and handed to the output sink
    records_processed: AtomicU64,

    /// Inbound messages discarded as undecodable
    decode_errors: AtomicU64,
}

impl ProcessorMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed record
    pub fn record_processed(&self) {
        self.records_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one discarded message
    pub fn record_decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Total processed records
    pub fn records_processed(&self) -> u64 {
        self.records_processed.load(Ordering::Relaxed)
    }

    /// Total discarded messages
    pub fn decode_errors(&self) -> u64 {
        self.decode_errors.load(Ordering::Relaxed)
    }

    /// Get snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            records_processed: self.records_processed(),
            decode_errors: self.decode_errors(),
        }
    }
}

/// Snapshot of processor counters (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub records_processed: u64,
    pub decode_errors: u64,
}
