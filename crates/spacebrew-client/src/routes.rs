//! Route requests and the local route cache
//!
//! The cache records the add/remove requests this client has issued. The
//! router owns the real routing table, so the cache is advisory: requests
//! are always sent, whether or not the cache already agrees.

use spacebrew_core::{Direction, Endpoint, Route, RouteOp};

use crate::admin::AdminRegistry;
use crate::error::{ClientError, Result};

/// A channel named by client and address, type not yet known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRef {
    pub client_name: String,
    pub remote_address: String,
    pub name: String,
}

impl ChannelRef {
    pub fn new(
        client_name: impl Into<String>,
        remote_address: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            remote_address: remote_address.into(),
            name: name.into(),
        }
    }

    fn resolve(self, registry: &AdminRegistry, direction: Direction) -> Endpoint {
        let channel_type = registry.resolve_channel_type(
            direction,
            &self.client_name,
            &self.remote_address,
            &self.name,
        );
        Endpoint::new(self.client_name, self.remote_address, self.name, channel_type)
    }
}

/// What a route request names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteTarget {
    /// Channels by name; types are looked up in the registry
    Channels {
        publisher: ChannelRef,
        subscriber: ChannelRef,
    },
    /// Fully described endpoints, used as given
    Endpoints(Route),
}

impl RouteTarget {
    /// Build the route, resolving channel types where needed
    ///
    /// Fails only when both types are known and differ.
    pub fn into_route(self, registry: &AdminRegistry) -> Result<Route> {
        match self {
            RouteTarget::Endpoints(route) => Ok(route),
            RouteTarget::Channels {
                publisher,
                subscriber,
            } => {
                let publisher = publisher.resolve(registry, Direction::Publish);
                let subscriber = subscriber.resolve(registry, Direction::Subscribe);

                if let (Some(pub_type), Some(sub_type)) =
                    (&publisher.channel_type, &subscriber.channel_type)
                {
                    if pub_type != sub_type {
                        return Err(ClientError::TypeMismatch {
                            publisher: pub_type.clone(),
                            subscriber: sub_type.clone(),
                        });
                    }
                }

                Ok(Route::new(publisher, subscriber))
            }
        }
    }
}

/// Routes this client has requested
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request; returns true if the cache changed
    ///
    /// `Add` skips duplicates, `Remove` drops every equal entry.
    pub fn apply(&mut self, op: RouteOp, route: &Route) -> bool {
        match op {
            RouteOp::Add => {
                if self.contains(route) {
                    false
                } else {
                    self.routes.push(route.clone());
                    true
                }
            }
            RouteOp::Remove => {
                let before = self.routes.len();
                self.routes.retain(|r| r != route);
                self.routes.len() != before
            }
        }
    }

    pub fn contains(&self, route: &Route) -> bool {
        self.routes.iter().any(|r| r == route)
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
