//! Client builder pattern

use spacebrew_core::{ChannelDeclaration, ChannelType, RemoteClient, RouteUpdate};

use crate::handlers::Handlers;
use crate::settings::{ClientSettings, Overrides};
use crate::{Result, Spacebrew};

/// Builder for Spacebrew client
#[derive(Default)]
pub struct SpacebrewBuilder {
    settings: ClientSettings,
    overrides: Overrides,
    handlers: Handlers,
    publish: Vec<ChannelDeclaration>,
    subscribe: Vec<ChannelDeclaration>,
}

impl SpacebrewBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing settings
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set router host
    pub fn server(mut self, server: &str) -> Self {
        self.settings.server = server.to_string();
        self
    }

    /// Set router port
    pub fn port(mut self, port: u16) -> Self {
        self.settings.port = port;
        self
    }

    /// Set client name
    pub fn name(mut self, name: &str) -> Self {
        self.settings.name = name.to_string();
        self
    }

    /// Set client description
    pub fn description(mut self, description: &str) -> Self {
        self.settings.description = description.to_string();
        self
    }

    /// Request admin privileges on connect
    pub fn admin(mut self, enabled: bool) -> Self {
        self.settings.admin = enabled;
        self
    }

    /// Externally supplied parameters; these win over the values above
    pub fn overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Declare a publish channel
    pub fn publish(
        mut self,
        name: &str,
        channel_type: impl Into<ChannelType>,
        default: Option<&str>,
    ) -> Self {
        self.publish.push(ChannelDeclaration::publish(
            name,
            channel_type,
            default.map(str::to_string),
        ));
        self
    }

    /// Declare a subscribe channel
    pub fn subscribe(mut self, name: &str, channel_type: impl Into<ChannelType>) -> Self {
        self.subscribe
            .push(ChannelDeclaration::subscribe(name, channel_type));
        self
    }

    /// Replace all handlers at once
    pub fn handlers(mut self, handlers: Handlers) -> Self {
        self.handlers = handlers;
        self
    }

    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_open(f);
        self
    }

    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_close(f);
        self
    }

    pub fn on_boolean(mut self, f: impl Fn(&str, bool) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_boolean(f);
        self
    }

    pub fn on_range(mut self, f: impl Fn(&str, f64) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_range(f);
        self
    }

    pub fn on_string(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_string(f);
        self
    }

    pub fn on_custom(mut self, f: impl Fn(&str, &str, &str) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_custom(f);
        self
    }

    pub fn on_new_client(mut self, f: impl Fn(&RemoteClient) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_new_client(f);
        self
    }

    pub fn on_updated_client(
        mut self,
        f: impl Fn(&RemoteClient) + Send + Sync + 'static,
    ) -> Self {
        self.handlers = self.handlers.on_updated_client(f);
        self
    }

    pub fn on_remove_client(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_remove_client(f);
        self
    }

    pub fn on_route_update(mut self, f: impl Fn(&RouteUpdate) + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_route_update(f);
        self
    }

    pub fn on_all_client_updates(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.handlers = self.handlers.on_all_client_updates(f);
        self
    }

    /// Build without connecting
    pub fn build(self) -> Spacebrew {
        let client = Spacebrew::new(self.settings, self.overrides, self.handlers);
        for declaration in self.publish {
            client.add_publish(declaration);
        }
        for declaration in self.subscribe {
            client.add_subscribe(declaration);
        }
        client
    }

    /// Build and connect
    pub async fn connect(self) -> Result<Spacebrew> {
        let client = self.build();
        client.connect().await?;
        Ok(client)
    }
}
