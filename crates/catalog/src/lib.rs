//! # Catalog
//!
//! Configuration watcher: observes a data-product catalog and forwards each
//! change to a `SettingsSink`.
//!
//! The subscription transport is abstracted behind `CatalogSubscriber`; the
//! in-process `MemoryCatalog` implementation backs tests and mock mode. A
//! fresh subscription first replays the catalog's current entries (initial
//! sync), then live changes in per-name order.

mod store;
mod subscriber;

pub use store::CatalogStore;
pub use subscriber::{CatalogSubscriber, MemoryCatalog};
