//! MemoryBroker - in-process broker for tests and mock mode

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::oneshot;
use tracing::debug;

use contracts::{BrokerPublisher, ContractError};

/// One message accepted by the memory broker
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    /// Destination subject
    pub subject: String,
    /// Payload as submitted
    pub payload: Bytes,
}

struct PendingAck {
    subject: String,
    tx: oneshot::Sender<Result<(), ContractError>>,
}

struct MemoryInner {
    auto_ack: bool,
    published: Mutex<Vec<PublishedMessage>>,
    pending: Mutex<Vec<PendingAck>>,
    refused: Mutex<HashSet<String>>,
}

/// In-process broker
///
/// Auto-ack mode resolves every publish immediately; manual mode parks acks
/// until the test completes or fails them, in any order.
#[derive(Clone)]
pub struct MemoryBroker {
    inner: Arc<MemoryInner>,
}

impl MemoryBroker {
    /// Create an auto-acking broker
    pub fn new() -> Self {
        Self::with_auto_ack(true)
    }

    /// Create a broker whose acks are resolved manually
    pub fn manual() -> Self {
        Self::with_auto_ack(false)
    }

    fn with_auto_ack(auto_ack: bool) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                auto_ack,
                published: Mutex::new(Vec::new()),
                pending: Mutex::new(Vec::new()),
                refused: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Refuse submissions whose subject starts with `prefix`
    pub fn refuse_subject(&self, prefix: impl Into<String>) {
        lock(&self.inner.refused).insert(prefix.into());
    }

    /// Snapshot of accepted messages
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.inner.published).clone()
    }

    /// Count of accepted messages
    pub fn published_count(&self) -> usize {
        lock(&self.inner.published).len()
    }

    /// Count of unresolved acks (manual mode)
    pub fn pending_count(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// Resolve the pending ack at `index` as accepted
    ///
    /// Returns the subject of the resolved publish, or `None` if out of range.
    /// Indices shift down after removal, which lets tests drain out of order.
    pub fn complete(&self, index: usize) -> Option<String> {
        let mut pending = lock(&self.inner.pending);
        if index >= pending.len() {
            return None;
        }
        let ack = pending.remove(index);
        let _ = ack.tx.send(Ok(()));
        Some(ack.subject)
    }

    /// Resolve the oldest pending ack as accepted
    pub fn complete_next(&self) -> Option<String> {
        self.complete(0)
    }

    /// Resolve every pending ack as accepted
    pub fn complete_all(&self) {
        let drained: Vec<PendingAck> = lock(&self.inner.pending).drain(..).collect();
        for ack in drained {
            let _ = ack.tx.send(Ok(()));
        }
    }

    /// Resolve the oldest pending ack as refused
    pub fn fail_next(&self, message: impl Into<String>) -> Option<String> {
        let mut pending = lock(&self.inner.pending);
        if pending.is_empty() {
            return None;
        }
        let ack = pending.remove(0);
        let _ = ack
            .tx
            .send(Err(ContractError::broker_publish(&ack.subject, message)));
        Some(ack.subject)
    }
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl BrokerPublisher for MemoryBroker {
    type Ack = Pin<Box<dyn Future<Output = Result<(), ContractError>> + Send>>;

    fn publish(&self, subject: &str, payload: Bytes) -> Result<Self::Ack, ContractError> {
        {
            let refused = lock(&self.inner.refused);
            if refused.iter().any(|prefix| subject.starts_with(prefix)) {
                return Err(ContractError::broker_publish(subject, "no session to subject"));
            }
        }

        lock(&self.inner.published).push(PublishedMessage {
            subject: subject.to_string(),
            payload,
        });
        debug!(subject = %subject, "memory broker accepted publish");

        if self.inner.auto_ack {
            return Ok(Box::pin(std::future::ready(Ok(()))));
        }

        let (tx, rx) = oneshot::channel();
        lock(&self.inner.pending).push(PendingAck {
            subject: subject.to_string(),
            tx,
        });

        let subject = subject.to_string();
        Ok(Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(ContractError::broker_publish(subject, "broker dropped")))
        }))
    }
}

// Mutation under the lock is a single push/remove, so a poisoned guard still
// holds a consistent map.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
