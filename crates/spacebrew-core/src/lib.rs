//! Spacebrew Core
//!
//! Core types and wire envelopes for the Spacebrew publish/subscribe
//! routing protocol.
//!
//! This crate provides:
//! - Channel and client configuration types ([`ChannelDeclaration`], [`ClientConfig`])
//! - Registry and routing types ([`RemoteClient`], [`Route`], [`Endpoint`])
//! - Inbound envelope classification ([`Envelope`])
//! - Outbound envelope construction ([`Outbound`])
//! - JSON encoding/decoding ([`codec`])

pub mod codec;
pub mod envelope;
pub mod error;
pub mod types;

pub use codec::{decode, encode};
pub use envelope::{AdminRequest, Envelope, Outbound, RemovedClient, RouteRequest, RouteUpdate};
pub use error::{Error, Result};
pub use types::*;

/// Default router host
pub const DEFAULT_SERVER: &str = "sandbox.spacebrew.cc";

/// Default router WebSocket port
pub const DEFAULT_PORT: u16 = 9000;

/// Default client name
pub const DEFAULT_NAME: &str = "rust client";

/// Default client description
pub const DEFAULT_DESCRIPTION: &str = "spacebrew rust client";
