//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Delivery Model
//! - Each inbound message is owned exclusively by one `Record` via its `MessageHandle`
//! - Acknowledge only after the broker durably accepts the republish
//! - Abandoned records are left to the upstream transport's redelivery

mod blueprint;
mod broker;
mod catalog;
mod error;
mod output;
mod record;
mod setting;
mod subject;

pub use blueprint::*;
pub use broker::BrokerPublisher;
pub use catalog::{CatalogEvent, CatalogOp, SettingsSink};
pub use error::*;
pub use output::OutputSink;
pub use record::{MessageHandle, Record};
pub use setting::DataProductSetting;
pub use subject::destination_subject;
