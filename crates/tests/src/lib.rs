//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - The full mock pipeline (source → processor → dispatcher → broker)
//! - Delivery guarantees under out-of-order broker acks
//! - Settings lifecycle through the catalog watcher
//! - Failure-path abandonment and construction-time failures

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_subject_contract() {
        // The bit-exact layout downstream consumers depend on
        let subject = contracts::destination_subject("ACME", "orders", 3, "created");
        assert_eq!(subject, "ACME.DP.orders.3.EVENT.created");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use broker::MemoryBroker;
    use bytes::Bytes;
    use catalog::MemoryCatalog;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::RelayBlueprint;
    use dispatcher::{create_dispatcher, DispatcherError};
    use processor::{HandleStats, InboundMessage, MockChangeSource, Processor, TrackingHandle};

    fn blueprint() -> RelayBlueprint {
        ConfigLoader::load_from_str(
            r#"
[routing]
domain = "ACME"
ack_timeout_secs = 5

[broker]
mode = "memory"

[[catalog.seed]]
name = "orders"
[catalog.seed.setting]
description = "order change events"

[processor]
partitions = 8
queue_capacity = 64
"#,
            ConfigFormat::Toml,
        )
        .unwrap()
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met within timeout");
    }

    fn inbound(raw: &str, stats: &Arc<HandleStats>) -> InboundMessage {
        InboundMessage {
            raw: Bytes::copy_from_slice(raw.as_bytes()),
            handle: Box::new(TrackingHandle::new(Arc::clone(stats))),
        }
    }

    /// End-to-end: MockChangeSource -> Processor -> Dispatcher -> MemoryBroker
    ///
    /// Verifies the full flow: synthetic change events are decoded, routed
    /// under well-formed subjects, published, and their inbound handles are
    /// acknowledged exactly once and released.
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let bp = blueprint();
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();

        let dispatcher = create_dispatcher(&bp, broker.clone(), catalog).await.unwrap();

        let (tx, rx) = processor::inbound_channel(bp.processor.queue_capacity);
        let record_processor = Arc::new(Processor::new(&bp.processor, dispatcher.output_sink()));
        let processor_task = Arc::clone(&record_processor).spawn(rx);

        let source = MockChangeSource::new(vec!["orders".into(), "users".into()], 1000.0);
        let stats = source.stats();
        let target = 12u64;

        let fed = tokio::time::timeout(Duration::from_secs(5), source.start(tx, Some(target)))
            .await
            .expect("source timed out")
            .unwrap();
        assert_eq!(fed, target);

        processor_task.await.unwrap();
        wait_until(|| dispatcher.metrics().published() == target).await;

        // Delivery guarantees: ack at most once, release exactly once
        assert_eq!(stats.acked(), target);
        assert_eq!(stats.released(), target);
        assert_eq!(stats.double_acks(), 0);
        assert_eq!(stats.abandoned(), 0);

        // Every subject carries the routing domain and subject layout
        let published = broker.published();
        assert_eq!(published.len(), target as usize);
        for message in &published {
            assert!(message.subject.starts_with("ACME.DP."), "got {}", message.subject);
            assert!(message.subject.contains(".EVENT."), "got {}", message.subject);
        }

        dispatcher.shutdown().await;
    }

    /// Publishes resolving out of order still acknowledge every record,
    /// without double-release, and complete all N (liveness)
    #[tokio::test]
    async fn test_out_of_order_publish_completion() {
        let bp = blueprint();
        let broker = MemoryBroker::manual();
        let catalog = MemoryCatalog::new();

        let dispatcher = create_dispatcher(&bp, broker.clone(), catalog).await.unwrap();
        let record_processor = Processor::new(&bp.processor, dispatcher.output_sink());
        let stats = Arc::new(HandleStats::default());

        let n = 6usize;
        for i in 0..n {
            let raw = format!(
                r#"{{"table":"orders","event":"created","primary_key":"orders-{i}"}}"#
            );
            record_processor.process(inbound(&raw, &stats)).unwrap();
        }
        wait_until(|| broker.pending_count() == n).await;

        // Resolve newest-first
        for index in (0..n).rev() {
            broker.complete(index);
        }

        wait_until(|| dispatcher.metrics().published() == n as u64).await;
        assert_eq!(stats.acked(), n as u64);
        assert_eq!(stats.released(), n as u64);
        assert_eq!(stats.double_acks(), 0);
        wait_until(|| dispatcher.metrics().inflight() == 0).await;

        dispatcher.shutdown().await;
    }

    /// Settings lifecycle: seed applies on initial sync, live apply then
    /// delete leaves no entry, undecodable update keeps the prior state
    #[tokio::test]
    async fn test_settings_lifecycle() {
        let bp = blueprint();
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();
        catalog.apply("prod-a", Bytes::from_static(b"{\"partitions\":4}"));

        let dispatcher = create_dispatcher(&bp, broker, catalog.clone()).await.unwrap();
        wait_until(|| dispatcher.registry().contains("prod-a")).await;
        assert_eq!(dispatcher.registry().get("prod-a").unwrap().partitions, Some(4));

        // Undecodable update is discarded; prior entry retained
        catalog.apply("prod-a", Bytes::from_static(b"not json"));
        wait_until(|| dispatcher.metrics().setting_errors() == 1).await;
        assert_eq!(dispatcher.registry().get("prod-a").unwrap().partitions, Some(4));

        // No publish or acknowledgment activity from settings sync
        assert_eq!(dispatcher.metrics().published(), 0);

        // Apply then delete ends with no entry
        catalog.delete("prod-a");
        wait_until(|| !dispatcher.registry().contains("prod-a")).await;
        assert!(dispatcher.registry().is_empty());

        dispatcher.shutdown().await;
    }

    /// Synchronous submission failure: the record's handle is never
    /// acknowledged or released, leaving the message to redelivery
    #[tokio::test]
    async fn test_submission_failure_abandons_record() {
        let bp = blueprint();
        let broker = MemoryBroker::new();
        broker.refuse_subject("ACME.DP.orders");
        let catalog = MemoryCatalog::new();

        let dispatcher = create_dispatcher(&bp, broker.clone(), catalog).await.unwrap();
        let record_processor = Processor::new(&bp.processor, dispatcher.output_sink());
        let stats = Arc::new(HandleStats::default());

        record_processor
            .process(inbound(
                r#"{"table":"orders","event":"created","primary_key":"k"}"#,
                &stats,
            ))
            .unwrap();

        assert_eq!(dispatcher.metrics().abandoned(), 1);
        assert_eq!(stats.acked(), 0);
        assert_eq!(stats.released(), 0);
        assert_eq!(broker.published_count(), 0);

        dispatcher.shutdown().await;
    }

    /// A failed catalog handshake is fatal to construction
    #[tokio::test]
    async fn test_construction_fails_without_catalog() {
        let bp = blueprint();
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();
        catalog.refuse_subscriptions();

        let result = create_dispatcher(&bp, broker, catalog).await;
        assert!(matches!(result, Err(DispatcherError::CatalogInit(_))));
    }

    /// Replay file pipeline: valid lines route, malformed lines are
    /// discarded without stopping the run
    #[tokio::test]
    async fn test_replay_file_pipeline() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"table":"orders","event":"created","primary_key":"a"}}"#).unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file, r#"{{"table":"orders","event":"updated","primary_key":"b"}}"#).unwrap();

        let bp = blueprint();
        let broker = MemoryBroker::new();
        let catalog = MemoryCatalog::new();

        let dispatcher = create_dispatcher(&bp, broker.clone(), catalog).await.unwrap();
        let (tx, rx) = processor::inbound_channel(bp.processor.queue_capacity);
        let record_processor = Arc::new(Processor::new(&bp.processor, dispatcher.output_sink()));
        let processor_task = Arc::clone(&record_processor).spawn(rx);

        let source = processor::ReplayChangeSource::new(file.path(), 0.0);
        let fed = source.run(tx).await.unwrap();
        assert_eq!(fed, 3);

        processor_task.await.unwrap();
        wait_until(|| dispatcher.metrics().published() == 2).await;
        assert_eq!(record_processor.metrics().decode_errors(), 1);
        assert_eq!(broker.published_count(), 2);

        dispatcher.shutdown().await;
    }
}
