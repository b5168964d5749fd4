//! Application callbacks
//!
//! One optional handler per event category. Unregistered events are
//! dropped silently.

use spacebrew_core::{RemoteClient, RouteUpdate};

/// Connection opened or closed
pub type LifecycleHandler = Box<dyn Fn() + Send + Sync>;
/// `(channel name, value)`
pub type BooleanHandler = Box<dyn Fn(&str, bool) + Send + Sync>;
/// `(channel name, value)`
pub type RangeHandler = Box<dyn Fn(&str, f64) + Send + Sync>;
/// `(channel name, value)`
pub type StringHandler = Box<dyn Fn(&str, &str) + Send + Sync>;
/// `(channel name, raw value, type tag)`
pub type CustomHandler = Box<dyn Fn(&str, &str, &str) + Send + Sync>;
/// Registry entry added or updated
pub type ClientHandler = Box<dyn Fn(&RemoteClient) + Send + Sync>;
/// `(client name, remote address)`
pub type RemoveClientHandler = Box<dyn Fn(&str, &str) + Send + Sync>;
/// Route change pushed by the router
pub type RouteHandler = Box<dyn Fn(&RouteUpdate) + Send + Sync>;

/// Registered handlers for a client
#[derive(Default)]
pub struct Handlers {
    open: Option<LifecycleHandler>,
    close: Option<LifecycleHandler>,
    boolean: Option<BooleanHandler>,
    range: Option<RangeHandler>,
    string: Option<StringHandler>,
    custom: Option<CustomHandler>,
    new_client: Option<ClientHandler>,
    updated_client: Option<ClientHandler>,
    remove_client: Option<RemoveClientHandler>,
    route_update: Option<RouteHandler>,
    all_client_updates: Option<LifecycleHandler>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.open = Some(Box::new(f));
        self
    }

    pub fn on_close(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }

    pub fn on_boolean(mut self, f: impl Fn(&str, bool) + Send + Sync + 'static) -> Self {
        self.boolean = Some(Box::new(f));
        self
    }

    pub fn on_range(mut self, f: impl Fn(&str, f64) + Send + Sync + 'static) -> Self {
        self.range = Some(Box::new(f));
        self
    }

    pub fn on_string(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.string = Some(Box::new(f));
        self
    }

    /// Receives messages whose type is not boolean, range or string
    pub fn on_custom(mut self, f: impl Fn(&str, &str, &str) + Send + Sync + 'static) -> Self {
        self.custom = Some(Box::new(f));
        self
    }

    pub fn on_new_client(mut self, f: impl Fn(&RemoteClient) + Send + Sync + 'static) -> Self {
        self.new_client = Some(Box::new(f));
        self
    }

    pub fn on_updated_client(
        mut self,
        f: impl Fn(&RemoteClient) + Send + Sync + 'static,
    ) -> Self {
        self.updated_client = Some(Box::new(f));
        self
    }

    pub fn on_remove_client(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.remove_client = Some(Box::new(f));
        self
    }

    pub fn on_route_update(mut self, f: impl Fn(&RouteUpdate) + Send + Sync + 'static) -> Self {
        self.route_update = Some(Box::new(f));
        self
    }

    /// Fires after every registry change (new, updated or removed client)
    pub fn on_all_client_updates(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.all_client_updates = Some(Box::new(f));
        self
    }

    pub(crate) fn open(&self) {
        if let Some(f) = &self.open {
            f();
        }
    }

    pub(crate) fn close(&self) {
        if let Some(f) = &self.close {
            f();
        }
    }

    pub(crate) fn boolean(&self, name: &str, value: bool) {
        if let Some(f) = &self.boolean {
            f(name, value);
        }
    }

    pub(crate) fn range(&self, name: &str, value: f64) {
        if let Some(f) = &self.range {
            f(name, value);
        }
    }

    pub(crate) fn string(&self, name: &str, value: &str) {
        if let Some(f) = &self.string {
            f(name, value);
        }
    }

    pub(crate) fn custom(&self, name: &str, value: &str, channel_type: &str) {
        if let Some(f) = &self.custom {
            f(name, value, channel_type);
        }
    }

    pub(crate) fn new_client(&self, client: &RemoteClient) {
        if let Some(f) = &self.new_client {
            f(client);
        }
    }

    pub(crate) fn updated_client(&self, client: &RemoteClient) {
        if let Some(f) = &self.updated_client {
            f(client);
        }
    }

    pub(crate) fn remove_client(&self, name: &str, remote_address: &str) {
        if let Some(f) = &self.remove_client {
            f(name, remote_address);
        }
    }

    pub(crate) fn route_update(&self, update: &RouteUpdate) {
        if let Some(f) = &self.route_update {
            f(update);
        }
    }

    pub(crate) fn all_client_updates(&self) {
        if let Some(f) = &self.all_client_updates {
            f();
        }
    }
}
