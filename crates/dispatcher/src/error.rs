//! Dispatcher error types

use contracts::ContractError;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Construction failed while establishing the catalog subscription
    #[error("failed to initialize catalog subscription: {0}")]
    CatalogInit(#[source] ContractError),

    /// Contract-level error
    #[error(transparent)]
    Contract(#[from] ContractError),
}
