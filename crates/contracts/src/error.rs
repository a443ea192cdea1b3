//! Layered error definitions
//!
//! Categorized by source: config / setting / registry / broker / catalog

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Data Product Errors =====
    /// Data product setting payload could not be decoded
    #[error("setting decode error for data product '{product}': {message}")]
    SettingDecode { product: String, message: String },

    /// Decoded setting was rejected by the registry
    #[error("registry rejected data product '{product}': {message}")]
    RegistryApply { product: String, message: String },

    // ===== Broker Errors =====
    /// Broker connection error
    #[error("broker connection error: {message}")]
    BrokerConnection { message: String },

    /// Publish could not be submitted or was not accepted
    #[error("broker publish error on '{subject}': {message}")]
    BrokerPublish { subject: String, message: String },

    // ===== Catalog Errors =====
    /// Catalog subscription could not be established
    #[error("catalog '{catalog}' subscribe error: {message}")]
    CatalogSubscribe { catalog: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create setting decode error
    pub fn setting_decode(product: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SettingDecode {
            product: product.into(),
            message: message.into(),
        }
    }

    /// Create registry apply error
    pub fn registry_apply(product: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RegistryApply {
            product: product.into(),
            message: message.into(),
        }
    }

    /// Create broker connection error
    pub fn broker_connection(message: impl Into<String>) -> Self {
        Self::BrokerConnection {
            message: message.into(),
        }
    }

    /// Create broker publish error
    pub fn broker_publish(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BrokerPublish {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create catalog subscribe error
    pub fn catalog_subscribe(catalog: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CatalogSubscribe {
            catalog: catalog.into(),
            message: message.into(),
        }
    }
}
