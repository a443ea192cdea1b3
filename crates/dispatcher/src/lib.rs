//! # Dispatcher
//!
//! The dispatch core: routes each processed record to its destination subject
//! and retires the originating inbound message only after the broker durably
//! accepts the republish.
//!
//! Wiring is capability-based: the processor talks to the core through
//! `OutputSink`, the catalog watcher through `SettingsSink`. Construction
//! establishes the catalog subscription and fails if the handshake fails.

mod dispatcher;
mod error;
mod metrics;
mod registry;
mod sync;

pub use dispatcher::{create_dispatcher, DispatchConfig, Dispatcher, DispatcherBuilder};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use registry::SettingsRegistry;
