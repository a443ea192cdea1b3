//! CatalogStore - subscription lifecycle and event forwarding

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{ContractError, SettingsSink};

use crate::subscriber::CatalogSubscriber;

/// Watches one catalog and forwards every observed change to a `SettingsSink`
pub struct CatalogStore<S: CatalogSubscriber> {
    subscriber: S,
    catalog: String,
    sink: Arc<dyn SettingsSink>,
}

impl<S: CatalogSubscriber> CatalogStore<S> {
    /// Create a store watching `catalog` on behalf of `sink`
    pub fn new(subscriber: S, catalog: impl Into<String>, sink: Arc<dyn SettingsSink>) -> Self {
        Self {
            subscriber,
            catalog: catalog.into(),
            sink,
        }
    }

    /// Establish the subscription and start forwarding
    ///
    /// # Errors
    /// Fails when the subscription handshake fails; nothing is spawned and
    /// the caller decides the process-level response.
    #[instrument(name = "catalog_store_start", skip(self), fields(catalog = %self.catalog))]
    pub async fn start(self) -> Result<JoinHandle<()>, ContractError> {
        let mut rx = self.subscriber.subscribe(&self.catalog).await?;
        info!(catalog = %self.catalog, "catalog subscription established");

        let sink = self.sink;
        let catalog = self.catalog;
        Ok(tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                debug!(
                    catalog = %catalog,
                    product = %event.name,
                    op = ?event.op,
                    "catalog change observed"
                );
                sink.sync_setting(event);
            }
            info!(catalog = %catalog, "catalog subscription closed");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriber::MemoryCatalog;
    use bytes::Bytes;
    use contracts::{CatalogEvent, CatalogOp};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<(CatalogOp, String)>>,
    }

    impl SettingsSink for CollectingSink {
        fn sync_setting(&self, event: CatalogEvent) {
            self.events.lock().unwrap().push((event.op, event.name));
        }
    }

    #[tokio::test]
    async fn test_store_forwards_changes_to_sink() {
        let catalog = MemoryCatalog::new();
        let sink = Arc::new(CollectingSink::default());

        let store = CatalogStore::new(catalog.clone(), "DATAPRODUCT", sink.clone());
        let task = store.start().await.unwrap();

        catalog.apply("orders", Bytes::from_static(b"{}"));
        catalog.delete("orders");

        // Drain: drop catalog so the forwarding task ends
        drop(catalog);
        task.await.unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            &[
                (CatalogOp::Apply, "orders".to_string()),
                (CatalogOp::Delete, "orders".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_start_fails_when_handshake_fails() {
        let catalog = MemoryCatalog::new();
        catalog.refuse_subscriptions();
        let sink = Arc::new(CollectingSink::default());

        let store = CatalogStore::new(catalog, "DATAPRODUCT", sink.clone());
        let result = store.start().await;
        assert!(result.is_err());
        assert!(sink.events.lock().unwrap().is_empty());
    }
}
