//! ChangeEnvelope - inbound message layout
//!
//! The transport delivers change events as JSON envelopes. Only the routing
//! metadata is read here; the raw bytes are republished verbatim.

use serde::{Deserialize, Serialize};

use crate::error::ProcessorError;
use crate::partition::partition_for;

/// One inbound change event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEnvelope {
    /// Source table / entity identifier
    pub table: String,

    /// Event name (e.g. "created", "updated")
    #[serde(rename = "event")]
    pub event_name: String,

    /// Primary key of the changed row, used for partition derivation
    #[serde(default)]
    pub primary_key: Option<String>,

    /// Explicit partition override
    #[serde(default)]
    pub partition: Option<u32>,

    /// Change payload, carried opaquely
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ChangeEnvelope {
    /// Decode an envelope from raw message bytes
    ///
    /// # Errors
    /// `EnvelopeDecode` for malformed JSON, `MissingField` for empty
    /// table/event; the caller discards the message for redelivery.
    pub fn decode(raw: &[u8]) -> Result<Self, ProcessorError> {
        let envelope: Self = serde_json::from_slice(raw)
            .map_err(|e| ProcessorError::EnvelopeDecode(e.to_string()))?;
        if envelope.table.is_empty() {
            return Err(ProcessorError::MissingField("table"));
        }
        if envelope.event_name.is_empty() {
            return Err(ProcessorError::MissingField("event"));
        }
        Ok(envelope)
    }

    /// Partition for this envelope
    ///
    /// An explicit partition wins; otherwise it is derived from the primary
    /// key (falling back to the table name) modulo `partitions`.
    pub fn partition_or_derived(&self, partitions: u32) -> u32 {
        match self.partition {
            Some(partition) => partition,
            None => {
                let key = self.primary_key.as_deref().unwrap_or(&self.table);
                partition_for(key, partitions)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_envelope() {
        let raw = br#"{
            "table": "orders",
            "event": "created",
            "primary_key": "orders-1001",
            "payload": { "id": 1001, "total": 25.0 }
        }"#;
        let envelope = ChangeEnvelope::decode(raw).unwrap();
        assert_eq!(envelope.table, "orders");
        assert_eq!(envelope.event_name, "created");
        assert_eq!(envelope.primary_key.as_deref(), Some("orders-1001"));
        assert!(envelope.partition.is_none());
    }

    #[test]
    fn test_decode_malformed() {
        let result = ChangeEnvelope::decode(b"not json");
        assert!(matches!(result, Err(ProcessorError::EnvelopeDecode(_))));
    }

    #[test]
    fn test_decode_empty_table() {
        let result = ChangeEnvelope::decode(br#"{"table": "", "event": "created"}"#);
        assert!(matches!(result, Err(ProcessorError::MissingField("table"))));
    }

    #[test]
    fn test_explicit_partition_wins() {
        let raw = br#"{"table": "orders", "event": "created", "primary_key": "k", "partition": 9}"#;
        let envelope = ChangeEnvelope::decode(raw).unwrap();
        assert_eq!(envelope.partition_or_derived(4), 9);
    }

    #[test]
    fn test_derived_partition_is_stable() {
        let raw = br#"{"table": "orders", "event": "created", "primary_key": "orders-1"}"#;
        let envelope = ChangeEnvelope::decode(raw).unwrap();
        let a = envelope.partition_or_derived(16);
        let b = envelope.partition_or_derived(16);
        assert_eq!(a, b);
        assert!(a < 16);
    }

    #[test]
    fn test_derivation_falls_back_to_table() {
        let raw = br#"{"table": "orders", "event": "created"}"#;
        let envelope = ChangeEnvelope::decode(raw).unwrap();
        assert_eq!(
            envelope.partition_or_derived(16),
            partition_for("orders", 16)
        );
    }
}
