//! Replay change source - feeds recorded envelopes from a JSONL file
//!
//! One envelope per line, fed in file order at a configurable pace. Line
//! validation is left to the processor, which discards undecodable messages.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_channel::Sender;
use bytes::Bytes;
use tracing::{info, instrument};

use contracts::ContractError;

use crate::mock::{HandleStats, TrackingHandle};
use crate::processor::InboundMessage;

/// Base pace of one hundred records per second at speed 1.0
const BASE_INTERVAL: Duration = Duration::from_millis(10);

/// Replays change envelopes from a JSONL file
pub struct ReplayChangeSource {
    path: PathBuf,
    speed: f64,
    stats: Arc<HandleStats>,
}

impl ReplayChangeSource {
    /// Create a replay source for `path` at `speed` (1.0 = base pace)
    pub fn new(path: impl Into<PathBuf>, speed: f64) -> Self {
        Self {
            path: path.into(),
            speed,
            stats: Arc::new(HandleStats::default()),
        }
    }

    /// Shared handle stats for this source's messages
    pub fn stats(&self) -> Arc<HandleStats> {
        Arc::clone(&self.stats)
    }

    /// Feed the file into `tx`, returning the number of lines fed
    ///
    /// # Errors
    /// IO errors reading the file.
    #[instrument(name = "replay_source_run", skip(self, tx), fields(path = %self.path.display()))]
    pub async fn run(&self, tx: Sender<InboundMessage>) -> Result<u64, ContractError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let delay = if self.speed > 0.0 {
            BASE_INTERVAL.div_f64(self.speed)
        } else {
            Duration::ZERO
        };

        let mut fed: u64 = 0;
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let msg = InboundMessage {
                raw: Bytes::copy_from_slice(line.as_bytes()),
                handle: Box::new(TrackingHandle::new(Arc::clone(&self.stats))),
            };
            if tx.send(msg).await.is_err() {
                break;
            }
            fed += 1;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        info!(fed, "replay finished");
        Ok(fed)
    }
}
