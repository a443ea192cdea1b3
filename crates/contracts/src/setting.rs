//! DataProductSetting - Catalog payload
//!
//! Decoded form of a data product's routing configuration. The dispatch core
//! only needs identity plus decode; everything else is carried opaquely for
//! consumers at the seam.

use serde::{Deserialize, Serialize};

use crate::ContractError;

/// A named routing configuration for one data product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProductSetting {
    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Whether the product is active
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Partition count override for this product
    #[serde(default)]
    pub partitions: Option<u32>,

    /// Backing stream name, if pinned
    #[serde(default)]
    pub stream: Option<String>,

    /// Opaque schema document
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl Default for DataProductSetting {
    fn default() -> Self {
        Self {
            description: String::new(),
            enabled: true,
            partitions: None,
            stream: None,
            schema: None,
        }
    }
}

impl DataProductSetting {
    /// Decode a setting from its serialized catalog payload
    ///
    /// # Errors
    /// `SettingDecode` on malformed payloads; the caller discards the change.
    pub fn decode(product: &str, payload: &[u8]) -> Result<Self, ContractError> {
        serde_json::from_slice(payload)
            .map_err(|e| ContractError::setting_decode(product, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let payload = br#"{
            "description": "order change events",
            "enabled": true,
            "partitions": 16,
            "stream": "orders-stream"
        }"#;
        let setting = DataProductSetting::decode("orders", payload).unwrap();
        assert_eq!(setting.description, "order change events");
        assert!(setting.enabled);
        assert_eq!(setting.partitions, Some(16));
        assert_eq!(setting.stream.as_deref(), Some("orders-stream"));
    }

    #[test]
    fn test_decode_defaults() {
        let setting = DataProductSetting::decode("orders", b"{}").unwrap();
        assert!(setting.enabled);
        assert!(setting.partitions.is_none());
    }

    #[test]
    fn test_decode_malformed_payload() {
        let result = DataProductSetting::decode("orders", b"not json");
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::SettingDecode { .. }));
        assert!(err.to_string().contains("orders"));
    }
}
