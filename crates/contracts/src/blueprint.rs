//! RelayBlueprint - Config Loader output
//!
//! Describes the full process configuration: routing domain, broker endpoint,
//! catalog to watch, and processor tuning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Routing settings
    pub routing: RoutingConfig,

    /// Broker endpoint settings
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Catalog watch settings
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Processor tuning
    #[serde(default)]
    pub processor: ProcessorConfig,
}

/// Routing settings
///
/// The domain is fixed at startup and prefixes every destination subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Routing domain (e.g. "ACME")
    pub domain: String,

    /// Upper bound on the per-publish durable-accept wait
    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
}

impl RoutingConfig {
    /// Ack wait bound as a `Duration`
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

fn default_ack_timeout_secs() -> u64 {
    30
}

/// Broker connection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokerMode {
    /// In-process broker, no external server required
    #[default]
    Memory,
    /// TCP connection to a broker server
    Tcp,
}

/// Broker endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Connection mode
    #[serde(default)]
    pub mode: BrokerMode,

    /// Broker server host (tcp mode)
    #[serde(default = "default_broker_host")]
    pub host: String,

    /// Broker server port (tcp mode)
    #[serde(default = "default_broker_port")]
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            mode: BrokerMode::Memory,
            host: default_broker_host(),
            port: default_broker_port(),
        }
    }
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    7400
}

/// Catalog watch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog name holding data product settings
    #[serde(default = "default_catalog_name")]
    pub name: String,

    /// Entries applied to the catalog at startup (memory catalog)
    #[serde(default)]
    pub seed: Vec<CatalogSeed>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            name: default_catalog_name(),
            seed: Vec::new(),
        }
    }
}

fn default_catalog_name() -> String {
    "DATAPRODUCT".to_string()
}

/// One seeded catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSeed {
    /// Data product name
    pub name: String,

    /// Setting document, stored encoded as the catalog payload
    pub setting: serde_json::Value,
}

/// Processor tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Partition count used when deriving partitions from primary keys
    #[serde(default = "default_partitions")]
    pub partitions: u32,

    /// Inbound queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            partitions: default_partitions(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_partitions() -> u32 {
    256
}

fn default_queue_capacity() -> usize {
    100
}
