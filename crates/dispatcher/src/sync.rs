//! Settings-sync handler - applies catalog changes to the registry
//!
//! A single bad change must never halt subsequent records or changes, so
//! every failure here is logged and swallowed.

use contracts::{BrokerPublisher, CatalogEvent, CatalogOp, DataProductSetting, SettingsSink};
use tracing::{info, warn};

use crate::dispatcher::DispatchCore;

impl<P: BrokerPublisher> SettingsSink for DispatchCore<P> {
    fn sync_setting(&self, event: CatalogEvent) {
        match event.op {
            CatalogOp::Delete => {
                self.registry.delete(&event.name);
                self.metrics.record_setting_deleted();
                info!(product = %event.name, "data product removed");
            }
            CatalogOp::Apply => {
                info!(product = %event.name, "syncing data product settings");

                let Some(payload) = event.payload else {
                    self.metrics.record_setting_error();
                    warn!(product = %event.name, "apply change without payload, discarded");
                    return;
                };

                let setting = match DataProductSetting::decode(&event.name, &payload) {
                    Ok(setting) => setting,
                    Err(e) => {
                        self.metrics.record_setting_error();
                        warn!(
                            product = %event.name,
                            error = %e,
                            "failed to decode data product settings, change discarded"
                        );
                        return;
                    }
                };

                if let Err(e) = self.registry.apply(&event.name, setting) {
                    self.metrics.record_setting_error();
                    warn!(
                        product = %event.name,
                        error = %e,
                        "failed to apply data product settings"
                    );
                    return;
                }
                self.metrics.record_setting_applied();
            }
        }
    }
}
