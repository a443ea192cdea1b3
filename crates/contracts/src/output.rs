//! OutputSink trait - Processor output interface
//!
//! Capability the processor calls once per fully processed record. The sink
//! owns the record's lifecycle thereafter.

use crate::Record;

/// Per-record output capability
///
/// `deliver` must not block the caller: implementations move any waiting onto
/// their own concurrent execution units.
pub trait OutputSink: Send + Sync {
    /// Take ownership of one processed record
    fn deliver(&self, record: Record);
}
