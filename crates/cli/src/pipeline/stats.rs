//! Pipeline statistics and metrics.

use std::time::Duration;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total inbound records processed
    pub records_processed: u64,

    /// Inbound messages discarded as undecodable
    pub records_discarded: u64,

    /// Records published, acknowledged and released
    pub records_published: u64,

    /// Records abandoned to transport redelivery
    pub records_abandoned: u64,

    /// Abandonments caused by an expired ack wait
    pub ack_timeouts: u64,

    /// Data product settings applied during the run
    pub settings_applied: u64,

    /// Data product settings deleted during the run
    pub settings_deleted: u64,

    /// Data products registered at shutdown
    pub products: usize,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Calculate published records per second
    pub fn rps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate abandon rate as percentage
    pub fn abandon_rate(&self) -> f64 {
        let total = self.records_published + self.records_abandoned;
        if total > 0 {
            (self.records_abandoned as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Pipeline Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Records processed: {}", self.records_processed);
        println!("   ├─ Records published: {}", self.records_published);
        println!("   ├─ Throughput: {:.2} records/s", self.rps());
        println!("   └─ Registered products: {}", self.products);

        println!("\n📈 Delivery");
        println!("   ├─ Abandoned for redelivery: {}", self.records_abandoned);
        println!("   ├─ Abandon rate: {:.2}%", self.abandon_rate());
        println!("   ├─ Ack timeouts: {}", self.ack_timeouts);
        println!("   └─ Undecodable messages: {}", self.records_discarded);

        if self.settings_applied > 0 || self.settings_deleted > 0 {
            println!("\n⚙ Settings Sync");
            println!("   ├─ Applied: {}", self.settings_applied);
            println!("   └─ Deleted: {}", self.settings_deleted);
        }

        println!();
    }
}
