//! Dispatcher - per-record routing and acknowledgment-gated publish

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use catalog::{CatalogStore, CatalogSubscriber};
use contracts::{
    destination_subject, BrokerPublisher, OutputSink, Record, RelayBlueprint, SettingsSink,
};

use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;
use crate::registry::SettingsRegistry;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Routing domain prefixing every destination subject
    pub domain: String,

    /// Catalog holding the data product settings
    pub catalog: String,

    /// Upper bound on the per-publish durable-accept wait
    pub ack_timeout: Duration,
}

impl DispatchConfig {
    /// Derive the dispatch configuration from a blueprint
    pub fn from_blueprint(blueprint: &RelayBlueprint) -> Self {
        Self {
            domain: blueprint.routing.domain.clone(),
            catalog: blueprint.catalog.name.clone(),
            ack_timeout: blueprint.routing.ack_timeout(),
        }
    }
}

/// The dispatch core shared by both capability seams
///
/// `OutputSink` routes records; `SettingsSink` maintains the registry. The
/// registry is the only mutable state, the publisher is shared read-only.
pub struct DispatchCore<P: BrokerPublisher> {
    pub(crate) domain: String,
    pub(crate) publisher: P,
    pub(crate) registry: SettingsRegistry,
    pub(crate) metrics: Arc<DispatchMetrics>,
    pub(crate) ack_timeout: Duration,
}

impl<P: BrokerPublisher> DispatchCore<P> {
    pub(crate) fn new(config: DispatchConfig, publisher: P) -> Self {
        Self {
            domain: config.domain,
            publisher,
            registry: SettingsRegistry::new(),
            metrics: Arc::new(DispatchMetrics::new()),
            ack_timeout: config.ack_timeout,
        }
    }

    /// Route one record and retire its inbound message after broker accept
    ///
    /// Submission failure abandons the record: the handle is dropped without
    /// ack or release, so the transport's redelivery owns the message again.
    /// On success the completion wait runs on its own task, so the caller is
    /// never stalled by broker latency.
    fn dispatch(&self, record: Record) {
        let Record {
            table,
            event_name,
            partition,
            payload,
            handle,
        } = record;

        let subject = destination_subject(&self.domain, &table, partition, &event_name);

        let ack = match self.publisher.publish(&subject, payload) {
            Ok(ack) => ack,
            Err(e) => {
                self.metrics.record_abandoned();
                warn!(
                    subject = %subject,
                    table = %table,
                    event = %event_name,
                    error = %e,
                    "publish submission failed, leaving message for redelivery"
                );
                return;
            }
        };

        let metrics = Arc::clone(&self.metrics);
        let ack_timeout = self.ack_timeout;
        metrics.inflight_inc();

        tokio::spawn(async move {
            let mut handle = handle;
            match tokio::time::timeout(ack_timeout, ack).await {
                Ok(Ok(())) => match handle.ack() {
                    Ok(()) => {
                        handle.release();
                        metrics.record_published();
                        debug!(subject = %subject, "record published and acknowledged");
                    }
                    Err(e) => {
                        metrics.record_abandoned();
                        warn!(
                            subject = %subject,
                            table = %table,
                            event = %event_name,
                            error = %e,
                            "inbound ack failed after broker accept"
                        );
                    }
                },
                Ok(Err(e)) => {
                    metrics.record_abandoned();
                    warn!(
                        subject = %subject,
                        table = %table,
                        event = %event_name,
                        error = %e,
                        "broker did not accept publish, leaving message for redelivery"
                    );
                }
                Err(_) => {
                    metrics.record_ack_timeout();
                    metrics.record_abandoned();
                    warn!(
                        subject = %subject,
                        table = %table,
                        event = %event_name,
                        waited_ms = ack_timeout.as_millis() as u64,
                        "publish ack wait expired, leaving message for redelivery"
                    );
                }
            }
            metrics.inflight_dec();
        });
    }
}

impl<P: BrokerPublisher> OutputSink for DispatchCore<P> {
    fn deliver(&self, record: Record) {
        self.dispatch(record);
    }
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder<P, S> {
    config: DispatchConfig,
    publisher: P,
    subscriber: S,
}

impl<P: BrokerPublisher, S: CatalogSubscriber + 'static> DispatcherBuilder<P, S> {
    /// Create a new DispatcherBuilder
    pub fn new(config: DispatchConfig, publisher: P, subscriber: S) -> Self {
        Self {
            config,
            publisher,
            subscriber,
        }
    }

    /// Build the dispatcher and establish the catalog subscription
    ///
    /// # Errors
    /// Fails when the subscription handshake fails; no background activity is
    /// started and the caller decides whether to retry process startup.
    #[instrument(name = "dispatcher_build", skip(self), fields(domain = %self.config.domain))]
    pub async fn build(self) -> Result<Dispatcher<P>, DispatcherError> {
        let catalog = self.config.catalog.clone();
        let core = Arc::new(DispatchCore::new(self.config, self.publisher));

        let sink: Arc<dyn SettingsSink> = Arc::clone(&core) as Arc<dyn SettingsSink>;
        let store = CatalogStore::new(self.subscriber, catalog, sink);
        let catalog_task = store.start().await.map_err(DispatcherError::CatalogInit)?;

        info!(domain = %core.domain, "dispatcher ready");
        Ok(Dispatcher { core, catalog_task })
    }
}

/// The assembled dispatch core
pub struct Dispatcher<P: BrokerPublisher> {
    core: Arc<DispatchCore<P>>,
    catalog_task: JoinHandle<()>,
}

impl<P: BrokerPublisher> Dispatcher<P> {
    /// Output capability for the record processor
    pub fn output_sink(&self) -> Arc<dyn OutputSink> {
        Arc::clone(&self.core) as Arc<dyn OutputSink>
    }

    /// Settings capability for additional watchers
    pub fn settings_sink(&self) -> Arc<dyn SettingsSink> {
        Arc::clone(&self.core) as Arc<dyn SettingsSink>
    }

    /// Live data product settings
    pub fn registry(&self) -> &SettingsRegistry {
        &self.core.registry
    }

    /// Dispatch metrics
    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        Arc::clone(&self.core.metrics)
    }

    /// Stop watching the catalog
    ///
    /// In-flight publish waits are owned by their own tasks and finish on
    /// their own; only the catalog forwarding stops here.
    #[instrument(name = "dispatcher_shutdown", skip(self))]
    pub async fn shutdown(self) {
        self.catalog_task.abort();
        let _ = self.catalog_task.await;
        debug!("dispatcher shutdown complete");
    }
}

/// Convenience function to create a dispatcher from a blueprint
#[instrument(name = "dispatcher_create", skip(blueprint, publisher, subscriber))]
pub async fn create_dispatcher<P, S>(
    blueprint: &RelayBlueprint,
    publisher: P,
    subscriber: S,
) -> Result<Dispatcher<P>, DispatcherError>
where
    P: BrokerPublisher,
    S: CatalogSubscriber + 'static,
{
    let config = DispatchConfig::from_blueprint(blueprint);
    DispatcherBuilder::new(config, publisher, subscriber).build().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker::MemoryBroker;
    use bytes::Bytes;
    use catalog::MemoryCatalog;
    use processor::{HandleStats, TrackingHandle};

    fn test_config() -> DispatchConfig {
        DispatchConfig {
            domain: "ACME".to_string(),
            catalog: "DATAPRODUCT".to_string(),
            ack_timeout: Duration::from_millis(200),
        }
    }

    fn record(table: &str, event: &str, partition: u32, stats: &Arc<HandleStats>) -> Record {
        Record::new(
            table,
            event,
            partition,
            Bytes::from_static(b"{}"),
            Box::new(TrackingHandle::new(Arc::clone(stats))),
        )
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within timeout");
    }

    #[tokio::test]
    async fn test_dispatch_publishes_then_acks() {
        let broker = MemoryBroker::new();
        let core = DispatchCore::new(test_config(), broker.clone());
        let stats = Arc::new(HandleStats::default());

        core.dispatch(record("orders", "created", 3, &stats));

        wait_until(|| core.metrics.published() == 1).await;
        let published = broker.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].subject, "ACME.DP.orders.3.EVENT.created");
        assert_eq!(stats.acked(), 1);
        assert_eq!(stats.released(), 1);
        assert_eq!(stats.abandoned(), 0);
    }

    #[tokio::test]
    async fn test_submission_failure_abandons_without_ack_or_release() {
        let broker = MemoryBroker::new();
        broker.refuse_subject("ACME.DP.orders");
        let core = DispatchCore::new(test_config(), broker.clone());
        let stats = Arc::new(HandleStats::default());

        core.dispatch(record("orders", "created", 0, &stats));

        assert_eq!(core.metrics.abandoned(), 1);
        assert_eq!(stats.acked(), 0);
        assert_eq!(stats.released(), 0);
        assert_eq!(stats.abandoned(), 1);
        assert_eq!(broker.published_count(), 0);
    }

    #[tokio::test]
    async fn test_broker_accept_failure_abandons() {
        let broker = MemoryBroker::manual();
        let core = DispatchCore::new(test_config(), broker.clone());
        let stats = Arc::new(HandleStats::default());

        core.dispatch(record("orders", "created", 0, &stats));
        wait_until(|| broker.pending_count() == 1).await;
        broker.fail_next("stream full");

        wait_until(|| core.metrics.abandoned() == 1).await;
        assert_eq!(stats.acked(), 0);
        assert_eq!(stats.released(), 0);
    }

    #[tokio::test]
    async fn test_ack_wait_expiry_abandons() {
        let broker = MemoryBroker::manual();
        let config = DispatchConfig {
            ack_timeout: Duration::from_millis(30),
            ..test_config()
        };
        let core = DispatchCore::new(config, broker.clone());
        let stats = Arc::new(HandleStats::default());

        core.dispatch(record("orders", "created", 0, &stats));

        wait_until(|| core.metrics.ack_timeouts() == 1).await;
        assert_eq!(core.metrics.abandoned(), 1);
        assert_eq!(stats.acked(), 0);
        wait_until(|| core.metrics.inflight() == 0).await;
    }

    #[tokio::test]
    async fn test_out_of_order_acks_complete_all_records() {
        let broker = MemoryBroker::manual();
        let core = DispatchCore::new(test_config(), broker.clone());
        let stats = Arc::new(HandleStats::default());

        for partition in 0..3 {
            core.dispatch(record("orders", "created", partition, &stats));
        }
        wait_until(|| broker.pending_count() == 3).await;

        // Resolve newest first; every record must still be acknowledged
        broker.complete(2);
        broker.complete(1);
        broker.complete(0);

        wait_until(|| core.metrics.published() == 3).await;
        assert_eq!(stats.acked(), 3);
        assert_eq!(stats.released(), 3);
        assert_eq!(stats.double_acks(), 0);
        wait_until(|| core.metrics.inflight() == 0).await;
    }

    #[tokio::test]
    async fn test_failed_inbound_ack_abandons_after_accept() {
        let broker = MemoryBroker::new();
        let core = DispatchCore::new(test_config(), broker.clone());
        let stats = Arc::new(HandleStats::default());

        let record = Record::new(
            "orders",
            "created",
            0,
            Bytes::from_static(b"{}"),
            Box::new(TrackingHandle::failing_ack(Arc::clone(&stats))),
        );
        core.dispatch(record);

        wait_until(|| core.metrics.abandoned() == 1).await;
        assert_eq!(stats.released(), 0);
        // Broker accepted; duplicate republish on redelivery is harmless
        assert_eq!(broker.published_count(), 1);
    }

    #[tokio::test]
    async fn test_builder_fails_when_catalog_unavailable() {
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();
        catalog.refuse_subscriptions();

        let result = DispatcherBuilder::new(test_config(), broker, catalog).build().await;
        assert!(matches!(result, Err(DispatcherError::CatalogInit(_))));
    }

    #[tokio::test]
    async fn test_builder_wires_catalog_to_registry() {
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();
        catalog.apply("orders", Bytes::from_static(b"{\"description\":\"orders\"}"));

        let dispatcher = DispatcherBuilder::new(test_config(), broker, catalog.clone())
            .build()
            .await
            .unwrap();

        let registry_len = || dispatcher.registry().len();
        wait_until(|| registry_len() == 1).await;
        assert!(dispatcher.registry().contains("orders"));

        catalog.delete("orders");
        wait_until(|| registry_len() == 0).await;

        dispatcher.shutdown().await;
    }
}
