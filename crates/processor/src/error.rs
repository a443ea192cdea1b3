//! Processor error types

use thiserror::Error;

/// Processor-specific errors
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Inbound message is not a valid change envelope
    #[error("envelope decode error: {0}")]
    EnvelopeDecode(String),

    /// Envelope decoded but a required field is empty
    #[error("envelope missing field '{0}'")]
    MissingField(&'static str),
}
