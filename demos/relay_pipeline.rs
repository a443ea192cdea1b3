//! Complete Relay Pipeline Demo
//!
//! Demonstrates wiring the full relay in process: a seeded memory catalog,
//! the dispatch core, the record processor, and a synthetic change source
//! publishing into the in-process broker.
//!
//! Run with: cargo run --bin relay_pipeline [config_path]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use broker::MemoryBroker;
use bytes::Bytes;
use catalog::MemoryCatalog;
use config_loader::{ConfigFormat, ConfigLoader};
use contracts::RelayBlueprint;
use dispatcher::create_dispatcher;
use processor::{MockChangeSource, Processor};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_CONFIG: &str = r#"
[routing]
domain = "ACME"
ack_timeout_secs = 5

[broker]
mode = "memory"

[[catalog.seed]]
name = "orders"
[catalog.seed.setting]
description = "order change events"
partitions = 8

[[catalog.seed]]
name = "users"
[catalog.seed.setting]
description = "user change events"

[processor]
partitions = 8
queue_capacity = 64
"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Relay Pipeline Demo");

    let blueprint = load_blueprint()?;
    info!(domain = %blueprint.routing.domain, "Blueprint loaded");

    // ==== Stage 1: Seed the catalog ====
    let catalog = MemoryCatalog::new();
    for seed in &blueprint.catalog.seed {
        let payload = serde_payload(&seed.setting);
        catalog.apply(&seed.name, payload);
    }
    info!(products = catalog.len(), "Catalog seeded");

    // ==== Stage 2: Build the dispatch core over an in-process broker ====
    let broker = MemoryBroker::new();
    let dispatcher = create_dispatcher(&blueprint, broker.clone(), catalog.clone()).await?;

    // ==== Stage 3: Start processor and synthetic change source ====
    let (tx, rx) = processor::inbound_channel(blueprint.processor.queue_capacity);
    let record_processor = Arc::new(Processor::new(
        &blueprint.processor,
        dispatcher.output_sink(),
    ));
    let processor_task = Arc::clone(&record_processor).spawn(rx);

    let target_records = 20u64;
    let tables: Vec<String> = blueprint.catalog.seed.iter().map(|s| s.name.clone()).collect();
    let source = MockChangeSource::new(tables, 200.0);
    let source_task = source.start(tx, Some(target_records));

    // ==== Stage 4: Live configuration change mid-run ====
    tokio::time::sleep(Duration::from_millis(50)).await;
    catalog.apply(
        "orders",
        Bytes::from_static(b"{\"description\":\"order change events\",\"partitions\":16}"),
    );
    info!("Updated 'orders' data product settings mid-run");

    // ==== Stage 5: Drain and report ====
    let fed = tokio::time::timeout(Duration::from_secs(10), source_task).await??;
    processor_task.await?;

    // Publish waits run on their own tasks; give them a moment to settle
    for _ in 0..100 {
        if dispatcher.metrics().inflight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let snapshot = dispatcher.metrics().snapshot();
    let stats = source.stats();
    info!(
        fed,
        published = snapshot.published,
        abandoned = snapshot.abandoned,
        acked = stats.acked(),
        released = stats.released(),
        "Pipeline complete"
    );

    for message in broker.published().iter().take(5) {
        info!(subject = %message.subject, bytes = message.payload.len(), "Published");
    }
    info!(
        products = dispatcher.registry().len(),
        orders_partitions = ?dispatcher.registry().get("orders").and_then(|s| s.partitions),
        "Registry state"
    );

    // ==== Stage 6: Graceful shutdown ====
    info!("Shutting down...");
    dispatcher.shutdown().await;

    info!("Relay Pipeline Demo finished");
    Ok(())
}

fn load_blueprint() -> Result<RelayBlueprint, Box<dyn std::error::Error>> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => Ok(ConfigLoader::load_from_path(&path)?),
        None => Ok(ConfigLoader::load_from_str(DEFAULT_CONFIG, ConfigFormat::Toml)?),
    }
}

fn serde_payload(value: &serde_json::Value) -> Bytes {
    Bytes::from(value.to_string())
}
