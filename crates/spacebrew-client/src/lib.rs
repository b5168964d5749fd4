//! Spacebrew Client Library
//!
//! Async client endpoint for the Spacebrew publish/subscribe router.
//!
//! # Example
//!
//! ```ignore
//! use spacebrew_client::Spacebrew;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sb = Spacebrew::builder()
//!         .server("localhost")
//!         .name("button")
//!         .publish("pressed", "boolean", Some("false"))
//!         .subscribe("light", "boolean")
//!         .on_boolean(|name, value| println!("{} = {}", name, value))
//!         .connect()
//!         .await?;
//!
//!     sb.send_boolean("pressed", true)?;
//!
//!     Ok(())
//! }
//! ```

pub mod admin;
pub mod builder;
pub mod client;
mod dispatch;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod settings;

pub use admin::{AdminRegistry, Upsert};
pub use builder::SpacebrewBuilder;
pub use client::{ConnectionState, Spacebrew};
pub use error::{ClientError, Result};
pub use handlers::Handlers;
pub use routes::{ChannelRef, RouteTable, RouteTarget};
pub use settings::{ClientSettings, Overrides};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::SpacebrewBuilder;
    pub use crate::client::{ConnectionState, Spacebrew};
    pub use crate::error::{ClientError, Result};
    pub use crate::settings::{ClientSettings, Overrides};
    pub use spacebrew_core::{ChannelType, Endpoint, RemoteClient, Route, RouteOp};
}
