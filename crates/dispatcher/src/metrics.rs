//! Dispatch metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counters for the dispatch core
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    /// Records with a submitted publish awaiting broker confirmation
    inflight: AtomicUsize,
    /// Records published, acknowledged and released
    published: AtomicU64,
    /// Records abandoned to transport redelivery
    abandoned: AtomicU64,
    /// Abandonments caused by an expired ack wait
    ack_timeouts: AtomicU64,
    /// Data product settings applied
    settings_applied: AtomicU64,
    /// Data product settings deleted
    settings_deleted: AtomicU64,
    /// Catalog changes discarded (decode or registry failure)
    setting_errors: AtomicU64,
}

impl DispatchMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Current in-flight publish count
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }

    /// Increment in-flight count
    pub fn inflight_inc(&self) {
        self.inflight.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement in-flight count
    pub fn inflight_dec(&self) {
        self.inflight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Total published-and-acknowledged records
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Record one published-and-acknowledged record
    pub fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    /// Total abandoned records
    pub fn abandoned(&self) -> u64 {
        self.abandoned.load(Ordering::Relaxed)
    }

    /// Record one abandoned record
    pub fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::Relaxed);
    }

    /// Total ack-wait expiries
    pub fn ack_timeouts(&self) -> u64 {
        self.ack_timeouts.load(Ordering::Relaxed)
    }

    /// Record one ack-wait expiry
    pub fn record_ack_timeout(&self) {
        self.ack_timeouts.fetch_add(1, Ordering::Relaxed);
    }

    /// Total settings applied
    pub fn settings_applied(&self) -> u64 {
        self.settings_applied.load(Ordering::Relaxed)
    }

    /// Record one applied setting
    pub fn record_setting_applied(&self) {
        self.settings_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Total settings deleted
    pub fn settings_deleted(&self) -> u64 {
        self.settings_deleted.load(Ordering::Relaxed)
    }

    /// Record one deleted setting
    pub fn record_setting_deleted(&self) {
        self.settings_deleted.fetch_add(1, Ordering::Relaxed);
    }

    /// Total discarded catalog changes
    pub fn setting_errors(&self) -> u64 {
        self.setting_errors.load(Ordering::Relaxed)
    }

    /// Record one discarded catalog change
    pub fn record_setting_error(&self) {
        self.setting_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inflight: self.inflight(),
            published: self.published(),
            abandoned: self.abandoned(),
            ack_timeouts: self.ack_timeouts(),
            settings_applied: self.settings_applied(),
            settings_deleted: self.settings_deleted(),
            setting_errors: self.setting_errors(),
        }
    }
}

/// Snapshot of dispatch metrics (for reporting)
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub inflight: usize,
    pub published: u64,
    pub abandoned: u64,
    pub ack_timeouts: u64,
    pub settings_applied: u64,
    pub settings_deleted: u64,
    pub setting_errors: u64,
}
