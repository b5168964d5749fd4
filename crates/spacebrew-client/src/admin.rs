//! Admin registry
//!
//! The router's view of every connected client, as pushed to admin
//! clients through configuration announcements. Entries are keyed by
//! `(name, remote_address)` and only change in response to router frames.
//!
//! The registry also infers this client's own remote address. The router
//! never states it directly, so the first announcement that carries the
//! local name and exactly the local channel shape (same names and types,
//! index by index, in both directions) is taken to be the router echoing
//! our own configuration. The address is assigned once and never revised.
//! Two distinct clients sharing a name and channel shape can therefore
//! resolve to the wrong address.

use spacebrew_core::{ChannelType, ClientConfig, Direction, Endpoint, RemoteClient};
use tracing::{debug, info};

/// Outcome of reconciling an announcement
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// Appended; carries the stored entry
    New(RemoteClient),
    /// Existing entry overwritten; carries the stored entry
    Updated(RemoteClient),
}

/// Registry of remote clients plus self-identity
#[derive(Debug, Clone, Default)]
pub struct AdminRegistry {
    active: bool,
    self_address: Option<String>,
    clients: Vec<RemoteClient>,
}

impl AdminRegistry {
    pub fn new(active: bool) -> Self {
        Self {
            active,
            ..Default::default()
        }
    }

    /// Whether this client registers for admin privileges
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// This client's address as seen by the router, once resolved
    pub fn self_address(&self) -> Option<&str> {
        self.self_address.as_deref()
    }

    pub fn clients(&self) -> &[RemoteClient] {
        &self.clients
    }

    /// Fold an announcement into the registry
    pub fn reconcile(&mut self, local: &ClientConfig, client: RemoteClient) -> Upsert {
        self.resolve_self(local, &client);

        match self
            .clients
            .iter_mut()
            .find(|c| c.is(&client.name, &client.remote_address))
        {
            Some(existing) => {
                debug!(
                    "Existing client {} at {} updated",
                    client.name, client.remote_address
                );
                existing.publish = client.publish;
                existing.subscribe = client.subscribe;
                existing.description = client.description;
                Upsert::Updated(existing.clone())
            }
            None => {
                debug!(
                    "New client {} at {}",
                    client.name, client.remote_address
                );
                self.clients.push(client.clone());
                Upsert::New(client)
            }
        }
    }

    /// Adopt the announced address if the announcement mirrors the local config
    ///
    /// Returns true only on the call that performs the assignment. An
    /// announcement without an address leaves the self address unresolved.
    pub fn resolve_self(&mut self, local: &ClientConfig, client: &RemoteClient) -> bool {
        if self.self_address.is_some()
            || client.remote_address.is_empty()
            || !client.mirrors(local)
        {
            return false;
        }
        info!("Resolved own remote address: {}", client.remote_address);
        self.self_address = Some(client.remote_address.clone());
        true
    }

    /// Drop an entry, returning it if present
    pub fn remove(&mut self, name: &str, remote_address: &str) -> Option<RemoteClient> {
        let index = self
            .clients
            .iter()
            .position(|c| c.is(name, remote_address))?;
        Some(self.clients.remove(index))
    }

    pub fn lookup(&self, name: &str, remote_address: &str) -> Option<&RemoteClient> {
        self.clients.iter().find(|c| c.is(name, remote_address))
    }

    /// Every channel of the given type in one direction, flattened
    ///
    /// Ordered by registry insertion, then by declaration order.
    pub fn list_by_type(&self, direction: Direction, channel_type: &ChannelType) -> Vec<Endpoint> {
        self.clients
            .iter()
            .flat_map(move |client| {
                client
                    .channels(direction)
                    .iter()
                    .filter(move |decl| &decl.channel_type == channel_type)
                    .map(move |decl| {
                        Endpoint::new(
                            client.name.clone(),
                            client.remote_address.clone(),
                            decl.name.clone(),
                            Some(decl.channel_type.clone()),
                        )
                    })
            })
            .collect()
    }

    /// Declared type of a channel on a known client
    pub fn resolve_channel_type(
        &self,
        direction: Direction,
        client_name: &str,
        remote_address: &str,
        channel: &str,
    ) -> Option<ChannelType> {
        self.clients
            .iter()
            .filter(|c| c.is(client_name, remote_address))
            .find_map(|c| c.channel_type(direction, channel))
            .cloned()
    }
}
