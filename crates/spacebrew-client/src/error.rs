//! Client error types

use spacebrew_core::ChannelType;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected")]
    NotConnected,

    #[error("already connected")]
    AlreadyConnected,

    #[error("{field} cannot change after connecting")]
    ImmutableConfig { field: &'static str },

    #[error("route type mismatch: publisher {publisher}, subscriber {subscriber}")]
    TypeMismatch {
        publisher: ChannelType,
        subscriber: ChannelType,
    },

    #[error("protocol error: {0}")]
    Protocol(#[from] spacebrew_core::Error),

    #[error("transport error: {0}")]
    Transport(#[from] spacebrew_transport::TransportError),
}
