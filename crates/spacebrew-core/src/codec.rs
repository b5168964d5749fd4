//! JSON codec for Spacebrew frames
//!
//! One envelope per transport message, UTF-8 JSON text.

use bytes::Bytes;

use crate::envelope::{Envelope, Outbound};
use crate::error::{Error, Result};

/// Encode an outbound envelope
pub fn encode(message: &Outbound) -> Result<Bytes> {
    serde_json::to_vec(message)
        .map(Bytes::from)
        .map_err(|e| Error::EncodeError(e.to_string()))
}

/// Decode and classify an inbound frame
pub fn decode(data: &[u8]) -> Result<Envelope> {
    let frame: serde_json::Value =
        serde_json::from_slice(data).map_err(|e| Error::DecodeError(e.to_string()))?;
    Ok(Envelope::classify(frame))
}
