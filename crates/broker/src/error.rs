//! Broker error types

use contracts::ContractError;
use thiserror::Error;

/// Result alias for broker operations
pub type Result<T> = std::result::Result<T, BrokerError>;

/// Broker-specific errors
#[derive(Debug, Error)]
pub enum BrokerError {
    /// Connection establishment or session error
    #[error("connection error: {0}")]
    Connection(String),

    /// Wire codec error
    #[error("wire codec error: {0}")]
    Codec(String),

    /// Incoming frame exceeds the size bound
    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// Connection closed by the peer
    #[error("connection closed")]
    Closed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BrokerError> for ContractError {
    fn from(err: BrokerError) -> Self {
        ContractError::broker_connection(err.to_string())
    }
}
