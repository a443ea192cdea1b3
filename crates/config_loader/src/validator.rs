//! Configuration validation
//!
//! Rules:
//! - routing.domain non-empty, no '.' or whitespace (subject composition)
//! - routing.ack_timeout_secs > 0
//! - broker.host non-empty in tcp mode
//! - catalog.name non-empty, seed names unique and non-empty
//! - processor.partitions > 0

use std::collections::HashSet;

use contracts::{BrokerMode, ContractError, RelayBlueprint};

/// Validate a RelayBlueprint
///
/// Returns the first encountered error, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_routing(blueprint)?;
    validate_broker(blueprint)?;
    validate_catalog(blueprint)?;
    validate_processor(blueprint)?;
    Ok(())
}

/// Validate routing domain and ack wait
fn validate_routing(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let domain = &blueprint.routing.domain;
    if domain.is_empty() {
        return Err(ContractError::config_validation(
            "routing.domain",
            "domain cannot be empty",
        ));
    }
    if domain.contains('.') || domain.contains(char::is_whitespace) {
        return Err(ContractError::config_validation(
            "routing.domain",
            format!("domain '{domain}' must not contain '.' or whitespace"),
        ));
    }
    if blueprint.routing.ack_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "routing.ack_timeout_secs",
            "ack timeout must be > 0",
        ));
    }
    Ok(())
}

/// Validate broker endpoint
fn validate_broker(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.broker.mode == BrokerMode::Tcp && blueprint.broker.host.is_empty() {
        return Err(ContractError::config_validation(
            "broker.host",
            "host cannot be empty in tcp mode",
        ));
    }
    Ok(())
}

/// Validate catalog name and seed entries
fn validate_catalog(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.catalog.name.is_empty() {
        return Err(ContractError::config_validation(
            "catalog.name",
            "catalog name cannot be empty",
        ));
    }

    let mut seen = HashSet::new();
    for (idx, seed) in blueprint.catalog.seed.iter().enumerate() {
        if seed.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("catalog.seed[{idx}].name"),
                "seed name cannot be empty",
            ));
        }
        if !seen.insert(&seed.name) {
            return Err(ContractError::config_validation(
                format!("catalog.seed[name={}]", seed.name),
                "duplicate seed name",
            ));
        }
    }
    Ok(())
}

/// Validate processor tuning
fn validate_processor(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.processor.partitions == 0 {
        return Err(ContractError::config_validation(
            "processor.partitions",
            "partitions must be > 0",
        ));
    }
    if blueprint.processor.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "processor.queue_capacity",
            "queue capacity must be > 0",
        ));
    }
    Ok(())
}
