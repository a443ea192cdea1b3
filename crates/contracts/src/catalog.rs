//! Catalog change events and the SettingsSink seam
//!
//! The configuration watcher observes a remote catalog and forwards each
//! observed change to a `SettingsSink`. Per-name ordering follows the order
//! the changes occurred; no ordering is guaranteed across names.

use bytes::Bytes;

/// Catalog change operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOp {
    /// Create-or-update an entry
    Apply,
    /// Remove an entry
    Delete,
}

/// One observed catalog change
#[derive(Debug, Clone)]
pub struct CatalogEvent {
    /// Operation tag
    pub op: CatalogOp,

    /// Data product name the change applies to
    pub name: String,

    /// Encoded setting payload; present only for apply
    pub payload: Option<Bytes>,
}

impl CatalogEvent {
    /// Create an apply event
    pub fn apply(name: impl Into<String>, payload: Bytes) -> Self {
        Self {
            op: CatalogOp::Apply,
            name: name.into(),
            payload: Some(payload),
        }
    }

    /// Create a delete event
    pub fn delete(name: impl Into<String>) -> Self {
        Self {
            op: CatalogOp::Delete,
            name: name.into(),
            payload: None,
        }
    }
}

/// Settings-sync capability the watcher calls
///
/// Implementations must tolerate malformed payloads: a single bad change is
/// logged and discarded, never propagated.
pub trait SettingsSink: Send + Sync {
    /// Apply one observed catalog change
    fn sync_setting(&self, event: CatalogEvent);
}
