//! Record - Processor output
//!
//! One normalized change event plus the exclusively-owned handle back to the
//! originating transport message.

use bytes::Bytes;

use crate::ContractError;

/// Handle back to the originating transport message.
///
/// Owned by exactly one `Record`. `ack` signals the transport that the message
/// may be considered delivered; it must only be called after the broker has
/// durably accepted the republish. `release` returns the message's resources
/// and consumes the handle.
///
/// A handle that is dropped without either call leaves the message
/// unacknowledged, so the transport's own redelivery takes over.
pub trait MessageHandle: Send {
    /// Acknowledge the originating message
    ///
    /// # Errors
    /// Returns a transport-level error; the caller decides whether to release.
    fn ack(&mut self) -> Result<(), ContractError>;

    /// Release the message's resources, consuming the handle
    fn release(self: Box<Self>);
}

/// One change event to be republished
///
/// Created by the processor per unit of work; consumed and terminated
/// (acknowledged + released) by the dispatch routine.
pub struct Record {
    /// Source table / entity identifier
    pub table: String,

    /// Event name (e.g. "created", "updated")
    pub event_name: String,

    /// Partition the event belongs to
    pub partition: u32,

    /// Raw serialized payload, republished verbatim
    pub payload: Bytes,

    /// Handle to the originating transport message
    pub handle: Box<dyn MessageHandle>,
}

impl Record {
    /// Create a new record
    pub fn new(
        table: impl Into<String>,
        event_name: impl Into<String>,
        partition: u32,
        payload: Bytes,
        handle: Box<dyn MessageHandle>,
    ) -> Self {
        Self {
            table: table.into(),
            event_name: event_name.into(),
            partition,
            payload,
            handle,
        }
    }
}

impl std::fmt::Debug for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.table)
            .field("event_name", &self.event_name)
            .field("partition", &self.partition)
            .field("payload_len", &self.payload.len())
            .finish_non_exhaustive()
    }
}
