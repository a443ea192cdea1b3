//! SettingsRegistry - live data product settings
//!
//! The only shared mutable state in the core. All mutation flows through the
//! settings-sync handler; dispatch paths and introspection read concurrently.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use contracts::{ContractError, DataProductSetting};

/// Concurrent map of data product settings
#[derive(Debug, Default)]
pub struct SettingsRegistry {
    products: RwLock<HashMap<String, Arc<DataProductSetting>>>,
}

impl SettingsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the setting for `name`
    ///
    /// # Errors
    /// `RegistryApply` for an empty name.
    pub fn apply(&self, name: &str, setting: DataProductSetting) -> Result<(), ContractError> {
        if name.is_empty() {
            return Err(ContractError::registry_apply(name, "empty data product name"));
        }
        self.write().insert(name.to_string(), Arc::new(setting));
        Ok(())
    }

    /// Remove the setting for `name`; idempotent
    pub fn delete(&self, name: &str) {
        self.write().remove(name);
    }

    /// Look up the setting for `name`
    pub fn get(&self, name: &str) -> Option<Arc<DataProductSetting>> {
        self.read().get(name).cloned()
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Count of registered products
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Check whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Registered product names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    // Mutation under the lock is a single insert/remove, so a poisoned guard
    // still holds a consistent map.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<DataProductSetting>>> {
        match self.products.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<DataProductSetting>>> {
        match self.products.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
