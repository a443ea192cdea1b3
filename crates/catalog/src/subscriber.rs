//! Catalog subscription abstraction
//!
//! `CatalogSubscriber` is the transport seam: the remote catalog's own
//! watch/subscribe protocol lives behind it. `MemoryCatalog` is the
//! in-process implementation used by tests and mock mode.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use contracts::{CatalogEvent, ContractError};

/// Per-subscriber queue depth; initial sync must fit alongside live changes
const SUBSCRIBER_CAPACITY: usize = 256;

/// Catalog watch transport
///
/// `subscribe` performs the handshake with the catalog; a failure here is a
/// construction-time failure for the caller. The returned receiver yields the
/// catalog's current entries as apply events first, then live changes.
pub trait CatalogSubscriber: Send + Sync {
    /// Subscribe to changes of `catalog`
    ///
    /// # Errors
    /// `CatalogSubscribe` when the handshake fails.
    fn subscribe(
        &self,
        catalog: &str,
    ) -> impl Future<Output = Result<mpsc::Receiver<CatalogEvent>, ContractError>> + Send;
}

struct MemoryCatalogState {
    entries: BTreeMap<String, Bytes>,
    subscribers: Vec<mpsc::Sender<CatalogEvent>>,
}

/// In-process catalog
///
/// Holds entries and fans every change out to all subscribers. Events are
/// queued without blocking; a subscriber that falls `SUBSCRIBER_CAPACITY`
/// events behind loses changes (logged).
#[derive(Clone)]
pub struct MemoryCatalog {
    state: Arc<Mutex<MemoryCatalogState>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryCatalogState {
                entries: BTreeMap::new(),
                subscribers: Vec::new(),
            })),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make subsequent subscribe handshakes fail (tests)
    pub fn refuse_subscriptions(&self) {
        self.unavailable.store(true, Ordering::SeqCst);
    }

    /// Create or update an entry, notifying subscribers
    pub fn apply(&self, name: impl Into<String>, payload: Bytes) {
        let name = name.into();
        let mut state = lock(&self.state);
        state.entries.insert(name.clone(), payload.clone());
        broadcast(&mut state, CatalogEvent::apply(name, payload));
    }

    /// Remove an entry, notifying subscribers; idempotent
    pub fn delete(&self, name: &str) {
        let mut state = lock(&self.state);
        state.entries.remove(name);
        broadcast(&mut state, CatalogEvent::delete(name));
    }

    /// Current entry count
    pub fn len(&self) -> usize {
        lock(&self.state).entries.len()
    }

    /// Check whether the catalog holds no entries
    pub fn is_empty(&self) -> bool {
        lock(&self.state).entries.is_empty()
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogSubscriber for MemoryCatalog {
    async fn subscribe(&self, catalog: &str) -> Result<mpsc::Receiver<CatalogEvent>, ContractError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ContractError::catalog_subscribe(catalog, "catalog unavailable"));
        }

        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);

        // Snapshot and registration under one lock so no change is lost or
        // reordered between the initial sync and the live stream.
        let mut state = lock(&self.state);
        for (name, payload) in &state.entries {
            if tx
                .try_send(CatalogEvent::apply(name.clone(), payload.clone()))
                .is_err()
            {
                return Err(ContractError::catalog_subscribe(
                    catalog,
                    "initial sync exceeds subscriber capacity",
                ));
            }
        }
        state.subscribers.push(tx);

        debug!(catalog = %catalog, entries = state.entries.len(), "memory catalog subscription");
        Ok(rx)
    }
}

fn broadcast(state: &mut MemoryCatalogState, event: CatalogEvent) {
    state.subscribers.retain(|tx| {
        match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(product = %event.name, "catalog subscriber lagging, change dropped");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    });
}

// Mutation under the lock never panics mid-update, so a poisoned guard still
// holds a consistent map.
fn lock(state: &Arc<Mutex<MemoryCatalogState>>) -> MutexGuard<'_, MemoryCatalogState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
