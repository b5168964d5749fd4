//! Error types for Spacebrew envelopes

use thiserror::Error;

/// Result type alias for envelope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Envelope error types
#[derive(Error, Debug)]
pub enum Error {
    /// Frame was not a JSON document
    #[error("decode error: {0}")]
    DecodeError(String),

    /// Envelope could not be serialized
    #[error("encode error: {0}")]
    EncodeError(String),
}
