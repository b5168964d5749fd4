//! Spacebrew Transport Layer
//!
//! This crate provides transport implementations for Spacebrew:
//! - WebSocket (text frames, one JSON envelope per frame)
//! - In-memory channel pair (embedding and tests)

pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use error::{Result, TransportError};
pub use memory::{ChannelReceiver, ChannelSender};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender};

#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConfig, WebSocketTransport};
