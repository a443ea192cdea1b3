//! Mock change source and tracking message handles
//!
//! Lets the full pipeline run without an inbound transport: synthetic change
//! envelopes are generated at a fixed rate, each carrying a `TrackingHandle`
//! whose ack/release/abandon counts back the delivery guarantees in tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use bytes::Bytes;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use contracts::{ContractError, MessageHandle};

use crate::processor::InboundMessage;

/// Shared ack/release accounting across a source's handles
#[derive(Debug, Default)]
pub struct HandleStats {
    acked: AtomicU64,
    released: AtomicU64,
    abandoned: AtomicU64,
    double_acks: AtomicU64,
}

impl HandleStats {
    /// Handles acknowledged exactly once
    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }

    /// Handles released
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Relaxed)
    }

    /// Handles dropped without release (left for redelivery)
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Acknowledge calls beyond the first on one handle
    pub fn double_acks(&self) -> u64 {
        self.double_acks.load(Ordering::Relaxed)
    }
}

/// Message handle that records its lifecycle in shared stats
pub struct TrackingHandle {
    stats: Arc<HandleStats>,
    acked: bool,
    released: bool,
    fail_ack: bool,
}

impl TrackingHandle {
    /// Create a handle reporting into `stats`
    pub fn new(stats: Arc<HandleStats>) -> Self {
        Self {
            stats,
            acked: false,
            released: false,
            fail_ack: false,
        }
    }

    /// Create a handle whose `ack` fails (transport gone)
    pub fn failing_ack(stats: Arc<HandleStats>) -> Self {
        Self {
            stats,
            acked: false,
            released: false,
            fail_ack: true,
        }
    }
}

impl MessageHandle for TrackingHandle {
    fn ack(&mut self) -> Result<(), ContractError> {
        if self.fail_ack {
            return Err(ContractError::Other("transport unavailable".to_string()));
        }
        if self.acked {
            self.stats.double_acks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.acked = true;
            self.stats.acked.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    fn release(mut self: Box<Self>) {
        self.released = true;
        self.stats.released.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for TrackingHandle {
    fn drop(&mut self) {
        if !self.released {
            self.stats.abandoned.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Synthetic change event source
///
/// Cycles through the configured tables emitting created/updated/deleted
/// events with incrementing primary keys.
pub struct MockChangeSource {
    tables: Vec<String>,
    rate_hz: f64,
    running: Arc<AtomicBool>,
    stats: Arc<HandleStats>,
}

const EVENTS: [&str; 3] = ["created", "updated", "deleted"];

impl MockChangeSource {
    /// Create a source emitting events for `tables` at `rate_hz`
    pub fn new(tables: Vec<String>, rate_hz: f64) -> Self {
        Self {
            tables,
            rate_hz,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(HandleStats::default()),
        }
    }

    /// Shared handle stats for this source's messages
    pub fn stats(&self) -> Arc<HandleStats> {
        Arc::clone(&self.stats)
    }

    /// Start emitting into `tx`; idempotent
    ///
    /// Stops when `stop` is called, `max_messages` is reached, or the
    /// channel closes.
    pub fn start(&self, tx: Sender<InboundMessage>, max_messages: Option<u64>) -> JoinHandle<u64> {
        if self.tables.is_empty() {
            info!("mock change source has no tables, nothing to emit");
            return tokio::spawn(async { 0 });
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return tokio::spawn(async { 0 });
        }

        let tables = self.tables.clone();
        let running = Arc::clone(&self.running);
        let stats = Arc::clone(&self.stats);
        let interval = Duration::from_secs_f64(1.0 / self.rate_hz.max(0.001));

        debug!(tables = tables.len(), rate_hz = self.rate_hz, "starting mock change source");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut seq: u64 = 0;

            loop {
                ticker.tick().await;
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(max) = max_messages {
                    if seq >= max {
                        running.store(false, Ordering::SeqCst);
                        break;
                    }
                }

                let table = &tables[(seq as usize) % tables.len()];
                let event = EVENTS[(seq as usize) % EVENTS.len()];
                let raw = format!(
                    r#"{{"table":"{table}","event":"{event}","primary_key":"{table}-{seq}","payload":{{"seq":{seq}}}}}"#,
                );

                let msg = InboundMessage {
                    raw: Bytes::from(raw),
                    handle: Box::new(TrackingHandle::new(Arc::clone(&stats))),
                };
                if tx.send(msg).await.is_err() {
                    break;
                }
                seq += 1;
            }

            info!(emitted = seq, "mock change source stopped");
            seq
        })
    }

    /// Stop emitting
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Check whether the source is emitting
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
