//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Event Relay - change-event routing and publish pipeline
#[derive(Parser, Debug)]
#[command(
    name = "event-relay",
    author,
    version,
    about = "Change-event routing and publish pipeline",
    long_about = "Routes normalized change events to a durable, partitioned message broker.\n\n\
                  Watches the data-product catalog for live routing configuration, republishes \n\
                  each record under its destination subject, and acknowledges inbound messages \n\
                  only after the broker durably accepts the republish."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENT_RELAY_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENT_RELAY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay pipeline
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "relay.toml", env = "EVENT_RELAY_CONFIG")]
    pub config: PathBuf,

    /// Override routing domain from configuration
    #[arg(long, env = "EVENT_RELAY_DOMAIN")]
    pub domain: Option<String>,

    /// Override broker host from configuration
    #[arg(long, env = "EVENT_RELAY_BROKER_HOST")]
    pub broker_host: Option<String>,

    /// Override broker port from configuration
    #[arg(long, env = "EVENT_RELAY_BROKER_PORT")]
    pub broker_port: Option<u16>,

    /// Maximum number of change events to feed (0 = unlimited)
    #[arg(long, default_value = "0", env = "EVENT_RELAY_MAX_RECORDS")]
    pub max_records: u64,

    /// Pipeline timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "EVENT_RELAY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Synthetic change event rate in events per second
    #[arg(long, default_value = "50.0", env = "EVENT_RELAY_RATE")]
    pub rate: f64,

    /// Replay recorded change events from a JSONL file instead of generating
    #[arg(long, env = "EVENT_RELAY_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = base pace)
    #[arg(long, default_value = "1.0", env = "EVENT_RELAY_REPLAY_SPEED")]
    pub replay_speed: f64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "EVENT_RELAY_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "relay.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show seeded data product details
    #[arg(long)]
    pub products: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
