//! Pipeline orchestrator - coordinates all components.
//!
//! Broker selection follows the blueprint: memory mode runs fully
//! self-contained, tcp mode connects to a broker server. Inbound change
//! events come from the synthetic generator or a replay file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use broker::{MemoryBroker, TcpBroker};
use catalog::MemoryCatalog;
use contracts::{BrokerMode, BrokerPublisher, RelayBlueprint};
use dispatcher::{create_dispatcher, Dispatcher};
use processor::{MockChangeSource, Processor, ReplayChangeSource};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::PipelineStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The relay blueprint configuration
    pub blueprint: RelayBlueprint,

    /// Maximum number of change events to feed (None = unlimited)
    pub max_records: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Synthetic change event rate
    pub mock_rate_hz: f64,

    /// Replay recorded change events from this path instead of generating
    pub replay_path: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = base pace)
    pub replay_speed: f64,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats, CliError> {
        match self.config.blueprint.broker.mode {
            BrokerMode::Memory => {
                info!("Running with in-process broker (no broker server required)");
                self.run_with_broker(MemoryBroker::new()).await
            }
            BrokerMode::Tcp => {
                let host = self.config.blueprint.broker.host.clone();
                let port = self.config.blueprint.broker.port;
                info!(host = %host, port, "Connecting to broker...");

                let publisher = TcpBroker::connect(&host, port)
                    .await
                    .map_err(|e| CliError::broker_connection(&host, port, e.to_string()))?;
                info!("Connected to broker");

                self.run_with_broker(publisher).await
            }
        }
    }

    /// Common pipeline logic shared between broker modes
    async fn run_with_broker<P: BrokerPublisher>(
        self,
        publisher: P,
    ) -> Result<PipelineStats, CliError> {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Seed the catalog
        let catalog = MemoryCatalog::new();
        for seed in &blueprint.catalog.seed {
            let payload = serde_json::to_vec(&seed.setting)
                .map_err(|e| CliError::pipeline_execution(e.to_string()))?;
            catalog.apply(&seed.name, payload.into());
        }
        info!(
            catalog = %blueprint.catalog.name,
            products = blueprint.catalog.seed.len(),
            "Catalog seeded"
        );

        // Build the dispatch core; this establishes the catalog subscription
        info!("Building dispatcher...");
        let dispatcher = create_dispatcher(blueprint, publisher, catalog.clone())
            .await
            .map_err(|e| CliError::pipeline_execution(e.to_string()))?;

        // Processor consumes the inbound queue and feeds the dispatch core
        info!("Starting processor...");
        let (tx, rx) = processor::inbound_channel(blueprint.processor.queue_capacity);
        let record_processor = Arc::new(Processor::new(
            &blueprint.processor,
            dispatcher.output_sink(),
        ));
        let processor_task = Arc::clone(&record_processor).spawn(rx);

        // Inbound change events: replay file or synthetic generator
        let mut mock_source = None;
        let source_task: JoinHandle<u64> = match &self.config.replay_path {
            Some(path) => {
                info!(path = %path.display(), "Running in REPLAY mode");
                let source = ReplayChangeSource::new(path, self.config.replay_speed);
                tokio::spawn(async move {
                    match source.run(tx).await {
                        Ok(fed) => fed,
                        Err(e) => {
                            error!(error = %e, "Replay failed");
                            0
                        }
                    }
                })
            }
            None => {
                info!(
                    rate_hz = self.config.mock_rate_hz,
                    max_records = ?self.config.max_records,
                    "Running in MOCK mode (synthetic change events)"
                );
                let tables = seed_tables(blueprint);
                let source = MockChangeSource::new(tables, self.config.mock_rate_hz);
                let task = source.start(tx, self.config.max_records);
                mock_source = Some(source);
                task
            }
        };

        info!("Pipeline running");

        // Drain loop: push metric deltas and wait until the inbound side is
        // done and every publish wait resolved
        let drain = async {
            let mut ticker = tokio::time::interval(Duration::from_millis(500));
            let mut last_dispatch = dispatcher::MetricsSnapshot::default();
            let mut last_processor = processor::MetricsSnapshot::default();

            loop {
                ticker.tick().await;
                push_facade_metrics(
                    &dispatcher,
                    &record_processor,
                    &mut last_dispatch,
                    &mut last_processor,
                );

                if processor_task.is_finished() && dispatcher.metrics().inflight() == 0 {
                    break;
                }
            }
        };

        let timed_out = match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, drain).await.is_err(),
            None => {
                drain.await;
                false
            }
        };

        if timed_out {
            warn!(
                timeout_secs = self.config.timeout.map(|t| t.as_secs()),
                "Pipeline timed out, stopping intake"
            );
            if let Some(ref source) = mock_source {
                source.stop();
            }
        } else {
            let fed = source_task.await.unwrap_or(0);
            info!(fed, "Inbound source finished");
        }

        // Final metric flush and stats assembly
        let dispatch_snapshot = dispatcher.metrics().snapshot();
        let processor_snapshot = record_processor.metrics().snapshot();
        observability::record_inflight(dispatch_snapshot.inflight);

        let stats = PipelineStats {
            records_processed: processor_snapshot.records_processed,
            records_discarded: processor_snapshot.decode_errors,
            records_published: dispatch_snapshot.published,
            records_abandoned: dispatch_snapshot.abandoned,
            ack_timeouts: dispatch_snapshot.ack_timeouts,
            settings_applied: dispatch_snapshot.settings_applied,
            settings_deleted: dispatch_snapshot.settings_deleted,
            products: dispatcher.registry().len(),
            duration: start_time.elapsed(),
        };

        info!("Shutting down pipeline...");
        dispatcher.shutdown().await;

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rps = format!("{:.2}", stats.rps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Tables the synthetic source emits events for
fn seed_tables(blueprint: &RelayBlueprint) -> Vec<String> {
    if blueprint.catalog.seed.is_empty() {
        vec!["orders".to_string(), "users".to_string()]
    } else {
        blueprint
            .catalog
            .seed
            .iter()
            .map(|seed| seed.name.clone())
            .collect()
    }
}

/// Record snapshot deltas into the metrics facade
fn push_facade_metrics<P: BrokerPublisher>(
    dispatcher: &Dispatcher<P>,
    record_processor: &Processor,
    last_dispatch: &mut dispatcher::MetricsSnapshot,
    last_processor: &mut processor::MetricsSnapshot,
) {
    let dispatch = dispatcher.metrics().snapshot();
    let proc = record_processor.metrics().snapshot();

    observability::record_records_processed(proc.records_processed - last_processor.records_processed);
    observability::record_decode_errors(proc.decode_errors - last_processor.decode_errors);
    observability::record_records_published(dispatch.published - last_dispatch.published);
    observability::record_records_abandoned(dispatch.abandoned - last_dispatch.abandoned);
    observability::record_ack_timeouts(dispatch.ack_timeouts - last_dispatch.ack_timeouts);
    observability::record_settings_synced(
        "applied",
        dispatch.settings_applied - last_dispatch.settings_applied,
    );
    observability::record_settings_synced(
        "deleted",
        dispatch.settings_deleted - last_dispatch.settings_deleted,
    );
    observability::record_settings_synced(
        "discarded",
        dispatch.setting_errors - last_dispatch.setting_errors,
    );
    observability::record_inflight(dispatch.inflight);

    *last_dispatch = dispatch;
    *last_processor = proc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::{ConfigFormat, ConfigLoader};

    fn mock_blueprint() -> RelayBlueprint {
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
queue_capacity = 32
"#,
            ConfigFormat::Toml,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_mock_pipeline_bounded_run() {
        let pipeline = Pipeline::new(PipelineConfig {
            blueprint: mock_blueprint(),
            max_records: Some(10),
            timeout: Some(Duration::from_secs(10)),
            metrics_port: None,
            mock_rate_hz: 1000.0,
            replay_path: None,
            replay_speed: 1.0,
        });

        let stats = pipeline.run().await.unwrap();
        assert_eq!(stats.records_processed, 10);
        assert_eq!(stats.records_published, 10);
        assert_eq!(stats.records_abandoned, 0);
        assert_eq!(stats.settings_applied, 1);
        assert_eq!(stats.products, 1);
    }

    #[tokio::test]
    async fn test_tcp_mode_unreachable_broker_fails() {
        let mut blueprint = mock_blueprint();
        blueprint.broker.mode = BrokerMode::Tcp;
        blueprint.broker.host = "127.0.0.1".to_string();
        blueprint.broker.port = 1;

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            max_records: Some(1),
            timeout: Some(Duration::from_secs(5)),
            metrics_port: None,
            mock_rate_hz: 10.0,
            replay_path: None,
            replay_speed: 1.0,
        });

        let result = pipeline.run().await;
        assert!(matches!(result, Err(CliError::BrokerConnection { .. })));
    }
}
