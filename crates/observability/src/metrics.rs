//! Relay metric recording helpers
//!
//! Thin wrappers over the `metrics` facade; the CLI records snapshot deltas
//! from the pipeline's atomic counters on every progress tick.

use metrics::{counter, gauge};

/// Record processed inbound records
pub fn record_records_processed(delta: u64) {
    if delta > 0 {
        counter!("event_relay_records_processed_total").increment(delta);
    }
}

/// Record published-and-acknowledged records
pub fn record_records_published(delta: u64) {
    if delta > 0 {
        counter!("event_relay_records_published_total").increment(delta);
    }
}

/// Record records abandoned to transport redelivery
pub fn record_records_abandoned(delta: u64) {
    if delta > 0 {
        counter!("event_relay_records_abandoned_total").increment(delta);
    }
}

/// Record expired publish ack waits
pub fn record_ack_timeouts(delta: u64) {
    if delta > 0 {
        counter!("event_relay_ack_timeouts_total").increment(delta);
    }
}

/// Record inbound messages discarded as undecodable
pub fn record_decode_errors(delta: u64) {
    if delta > 0 {
        counter!("event_relay_decode_errors_total").increment(delta);
    }
}

/// Record synced data product settings by outcome
///
/// `op` is one of "applied", "deleted", "discarded".
pub fn record_settings_synced(op: &str, delta: u64) {
    if delta > 0 {
        counter!(
            "event_relay_settings_synced_total",
            "op" => op.to_string()
        )
        .increment(delta);
    }
}

/// Record publishes currently awaiting broker confirmation
pub fn record_inflight(inflight: usize) {
    gauge!("event_relay_publishes_inflight").set(inflight as f64);
}
