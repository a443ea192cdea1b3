//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref domain) = args.domain {
        info!(domain = %domain, "Overriding routing domain from CLI");
        blueprint.routing.domain = domain.clone();
    }
    if let Some(ref host) = args.broker_host {
        info!(host = %host, "Overriding broker host from CLI");
        blueprint.broker.host = host.clone();
    }
    if let Some(port) = args.broker_port {
        info!(port = %port, "Overriding broker port from CLI");
        blueprint.broker.port = port;
    }

    info!(
        domain = %blueprint.routing.domain,
        broker_mode = ?blueprint.broker.mode,
        catalog = %blueprint.catalog.name,
        products = blueprint.catalog.seed.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        max_records: if args.max_records == 0 {
            None
        } else {
            Some(args.max_records)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        mock_rate_hz: args.rate,
        replay_path: args.replay.clone(),
        replay_speed: args.replay_speed,
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        records_published = stats.records_published,
                        records_abandoned = stats.records_abandoned,
                        duration_secs = stats.duration.as_secs_f64(),
                        rps = format!("{:.2}", stats.rps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Event Relay finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Routing:");
    println!("  Domain: {}", blueprint.routing.domain);
    println!("  Ack timeout: {}s", blueprint.routing.ack_timeout_secs);
    println!("\nBroker:");
    println!("  Mode: {:?}", blueprint.broker.mode);
    if blueprint.broker.mode == contracts::BrokerMode::Tcp {
        println!("  Endpoint: {}:{}", blueprint.broker.host, blueprint.broker.port);
    }
    println!("\nCatalog: {}", blueprint.catalog.name);
    if !blueprint.catalog.seed.is_empty() {
        println!("\nSeeded data products ({}):", blueprint.catalog.seed.len());
        for seed in &blueprint.catalog.seed {
            println!("  - {}", seed.name);
        }
    }
    println!(
        "\nProcessor:\n  Partitions: {}\n  Queue capacity: {}",
        blueprint.processor.partitions, blueprint.processor.queue_capacity
    );
    println!();
}
