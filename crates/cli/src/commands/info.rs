//! `info` command implementation.

use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    routing: RoutingInfo,
    broker: BrokerInfo,
    catalog: CatalogInfo,
    processor: ProcessorInfo,
}

#[derive(Serialize)]
struct RoutingInfo {
    domain: String,
    ack_timeout_secs: u64,
}

#[derive(Serialize)]
struct BrokerInfo {
    mode: String,
    host: String,
    port: u16,
}

#[derive(Serialize)]
struct CatalogInfo {
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    products: Vec<ProductInfo>,
}

#[derive(Serialize)]
struct ProductInfo {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    setting: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ProcessorInfo {
    partitions: u32,
    queue_capacity: usize,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<(), CliError> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()));
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)?;
    let config_info = build_info(&blueprint, args.products);

    if args.json {
        let json = serde_json::to_string_pretty(&config_info)
            .map_err(|e| CliError::pipeline_execution(e.to_string()))?;
        println!("{}", json);
    } else {
        print_info(&config_info);
    }

    Ok(())
}

fn build_info(blueprint: &contracts::RelayBlueprint, with_settings: bool) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        routing: RoutingInfo {
            domain: blueprint.routing.domain.clone(),
            ack_timeout_secs: blueprint.routing.ack_timeout_secs,
        },
        broker: BrokerInfo {
            mode: format!("{:?}", blueprint.broker.mode),
            host: blueprint.broker.host.clone(),
            port: blueprint.broker.port,
        },
        catalog: CatalogInfo {
            name: blueprint.catalog.name.clone(),
            products: blueprint
                .catalog
                .seed
                .iter()
                .map(|seed| ProductInfo {
                    name: seed.name.clone(),
                    setting: with_settings.then(|| seed.setting.clone()),
                })
                .collect(),
        },
        processor: ProcessorInfo {
            partitions: blueprint.processor.partitions,
            queue_capacity: blueprint.processor.queue_capacity,
        },
    }
}

fn print_info(config: &ConfigInfo) {
    println!("\n=== Event Relay Configuration ===\n");
    println!("Version: {}", config.version);
    println!("\nRouting:");
    println!("  Domain: {}", config.routing.domain);
    println!("  Ack timeout: {}s", config.routing.ack_timeout_secs);
    println!("\nBroker:");
    println!("  Mode: {}", config.broker.mode);
    println!("  Endpoint: {}:{}", config.broker.host, config.broker.port);
    println!("\nCatalog: {}", config.catalog.name);

    if !config.catalog.products.is_empty() {
        println!("\nSeeded data products ({}):", config.catalog.products.len());
        for product in &config.catalog.products {
            match &product.setting {
                Some(setting) => println!("  - {}: {}", product.name, setting),
                None => println!("  - {}", product.name),
            }
        }
    }

    println!("\nProcessor:");
    println!("  Partitions: {}", config.processor.partitions);
    println!("  Queue capacity: {}", config.processor.queue_capacity);
    println!();
}
