//! Wire protocol - length-prefixed bincode frames
//!
//! Each frame is a big-endian u32 body length followed by the bincode-encoded
//! `Frame`. Acks correlate to publishes by sequence number.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{BrokerError, Result};

/// Upper bound on a single frame body
pub const MAX_FRAME_SIZE: usize = 8 * 1024 * 1024;

/// Broker protocol frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// Client → broker: publish `payload` under `subject`
    Publish {
        seq: u64,
        subject: String,
        payload: Vec<u8>,
    },

    /// Broker → client: durable-accept confirmation for `seq`
    ///
    /// `error` carries the broker's reason when the publish was not accepted.
    Ack { seq: u64, error: Option<String> },
}

/// Encode a frame with its length prefix
pub fn encode(frame: &Frame) -> Result<Vec<u8>> {
    let body = bincode::serialize(frame).map_err(|e| BrokerError::Codec(e.to_string()))?;
    if body.len() > MAX_FRAME_SIZE {
        return Err(BrokerError::FrameTooLarge {
            size: body.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let mut buf = Vec::with_capacity(4 + body.len());
    buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
    buf.extend_from_slice(&body);
    Ok(buf)
}

/// Decode a frame body (without length prefix)
pub fn decode(body: &[u8]) -> Result<Frame> {
    bincode::deserialize(body).map_err(|e| BrokerError::Codec(e.to_string()))
}

/// Read one frame from an async stream
///
/// Returns `None` on a clean EOF at a frame boundary.
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Frame>> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(BrokerError::FrameTooLarge {
            size: len,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    decode(&body).map(Some)
}
