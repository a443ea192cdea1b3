//! BrokerPublisher trait - broker client abstraction
//!
//! Abstracts the asynchronous, acknowledgment-returning publish primitive,
//! supporting real connections and in-process testing behind one seam.

use std::future::Future;

use bytes::Bytes;

use crate::ContractError;

/// Asynchronous publish capability against a partitioned broker
///
/// `publish` submits without blocking and returns a future that resolves once
/// the broker durably accepts that specific message (not a generic connected
/// signal). A synchronous `Err` means the submission itself failed, e.g. no
/// session is available.
pub trait BrokerPublisher: Send + Sync + 'static {
    /// Durable-accept confirmation for one submitted publish
    type Ack: Future<Output = Result<(), ContractError>> + Send + 'static;

    /// Submit a publish of `payload` under `subject`
    ///
    /// # Errors
    /// `BrokerPublish` when the submission cannot be initiated.
    fn publish(&self, subject: &str, payload: Bytes) -> Result<Self::Ack, ContractError>;
}
