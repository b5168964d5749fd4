//! Main Spacebrew client implementation

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use spacebrew_core::{
    codec, ChannelDeclaration, ChannelType, ClientConfig, DataMessage, Direction, Endpoint,
    Outbound, RemoteClient, Route, RouteOp,
};
use spacebrew_transport::{
    Transport, TransportEvent, TransportReceiver, TransportSender, WebSocketTransport,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::admin::AdminRegistry;
use crate::builder::SpacebrewBuilder;
use crate::dispatch;
use crate::error::{ClientError, Result};
use crate::handlers::Handlers;
use crate::routes::{ChannelRef, RouteTable, RouteTarget};
use crate::settings::{ClientSettings, Overrides};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Work for the writer task
enum Outgoing {
    Frame(Bytes),
    Close,
}

/// Mutable client state, touched only under the lock
pub(crate) struct ClientState {
    pub(crate) overrides: Overrides,
    pub(crate) config: ClientConfig,
    pub(crate) connection: ConnectionState,
    pub(crate) admin: AdminRegistry,
    pub(crate) routes: RouteTable,
    outbound: Option<mpsc::UnboundedSender<Outgoing>>,
    /// Bumped on every attach so stale transport tasks can be told apart
    session: u64,
}

impl ClientState {
    /// Queue an envelope for the writer task
    fn enqueue(&self, message: &Outbound) -> Result<()> {
        let tx = match (&self.outbound, self.connection) {
            (Some(tx), ConnectionState::Connected) => tx,
            _ => return Err(ClientError::NotConnected),
        };
        let data = codec::encode(message)?;
        tx.send(Outgoing::Frame(data))
            .map_err(|_| ClientError::NotConnected)
    }

    /// Announce the full configuration, plus the admin request when enabled
    fn sync_config(&self) -> Result<()> {
        debug!(
            "Sending config: {} publish, {} subscribe",
            self.config.publish.len(),
            self.config.subscribe.len()
        );
        self.enqueue(&Outbound::Config(self.config.clone()))?;
        if self.admin.is_active() {
            self.enqueue(&Outbound::admin_registration())?;
        }
        Ok(())
    }
}

/// State shared with the transport tasks
pub(crate) struct Shared {
    pub(crate) state: Mutex<ClientState>,
    pub(crate) handlers: Handlers,
}

/// A Spacebrew client
///
/// Cloning yields another handle to the same connection.
#[derive(Clone)]
pub struct Spacebrew {
    url: String,
    shared: Arc<Shared>,
}

impl Spacebrew {
    /// Create a new client (use builder for more options)
    pub fn new(settings: ClientSettings, overrides: Overrides, handlers: Handlers) -> Self {
        let settings = settings.apply(&overrides);
        let url = settings.url();

        let state = ClientState {
            overrides,
            config: ClientConfig::new(settings.name, settings.description),
            connection: ConnectionState::Disconnected,
            admin: AdminRegistry::new(settings.admin),
            routes: RouteTable::new(),
            outbound: None,
            session: 0,
        };

        Self {
            url,
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                handlers,
            }),
        }
    }

    /// Create a builder
    pub fn builder() -> SpacebrewBuilder {
        SpacebrewBuilder::new()
    }

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.shared.state.lock()
    }

    /// Router URL
    pub fn url(&self) -> &str {
        &self.url
    }

    // ------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------

    fn begin_connect(&self) -> Result<()> {
        let mut state = self.lock();
        if state.connection != ConnectionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        state.connection = ConnectionState::Connecting;
        Ok(())
    }

    /// Connect to the router over WebSocket
    ///
    /// On failure the client is left disconnected.
    pub async fn connect(&self) -> Result<()> {
        self.begin_connect()?;

        info!("Connecting to {}", self.url);

        match <WebSocketTransport as Transport>::connect(&self.url).await {
            Ok((sender, receiver)) => {
                self.attach(sender, receiver);
                Ok(())
            }
            Err(e) => {
                self.lock().connection = ConnectionState::Disconnected;
                error!("Connection attempt to {} failed: {}", self.url, e);
                Err(ClientError::ConnectionFailed(e.to_string()))
            }
        }
    }

    /// Drive the client over an already established transport
    pub async fn connect_with<S, R>(&self, sender: S, receiver: R) -> Result<()>
    where
        S: TransportSender + 'static,
        R: TransportReceiver + 'static,
    {
        self.begin_connect()?;
        self.attach(sender, receiver);
        Ok(())
    }

    fn attach<S, R>(&self, sender: S, mut receiver: R)
    where
        S: TransportSender + 'static,
        R: TransportReceiver + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Outgoing>();

        let session = {
            let mut state = self.lock();
            state.session += 1;
            state.outbound = Some(tx);
            state.session
        };

        // Spawn writer task
        tokio::spawn(async move {
            while let Some(item) = rx.recv().await {
                match item {
                    Outgoing::Frame(data) => {
                        if let Err(e) = sender.send(data).await {
                            error!("Send error: {}", e);
                            break;
                        }
                    }
                    Outgoing::Close => {
                        if let Err(e) = sender.close().await {
                            warn!("Close error: {}", e);
                        }
                        break;
                    }
                }
            }
        });

        // Spawn receiver task
        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                match event {
                    TransportEvent::Connected => on_open(&shared, session),
                    TransportEvent::Data(data) => dispatch::handle_frame(&shared, &data),
                    TransportEvent::Disconnected { reason } => {
                        debug!("Transport disconnected: {:?}", reason);
                        on_closed(&shared, session);
                        return;
                    }
                    TransportEvent::Error(e) => {
                        error!("Transport error: {}", e);
                    }
                }
            }
            on_closed(&shared, session);
        });
    }

    /// Close the connection; no-op unless connected
    pub fn close(&self) {
        let mut state = self.lock();
        if state.connection != ConnectionState::Connected {
            return;
        }
        if let Some(tx) = state.outbound.take() {
            let _ = tx.send(Outgoing::Close);
        }
        state.connection = ConnectionState::Disconnected;
        info!("Closing Spacebrew connection");
    }

    /// Check if connected
    pub fn is_connected(&self) -> bool {
        self.lock().connection == ConnectionState::Connected
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().connection
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    pub fn name(&self) -> String {
        self.lock().config.name.clone()
    }

    pub fn description(&self) -> String {
        self.lock().config.description.clone()
    }

    /// Snapshot of the configuration announced to the router
    pub fn config(&self) -> ClientConfig {
        self.lock().config.clone()
    }

    /// Rename the client before connecting
    ///
    /// A `name` override, if present, still takes precedence. An empty
    /// name leaves the current one in place.
    pub fn set_name(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if state.connection == ConnectionState::Connected {
            warn!("Name cannot change while connected");
            return Err(ClientError::ImmutableConfig { field: "name" });
        }
        if !name.is_empty() {
            state.config.name = state
                .overrides
                .name
                .clone()
                .unwrap_or_else(|| name.to_string());
        }
        Ok(())
    }

    /// Change the description before connecting
    pub fn set_description(&self, description: &str) -> Result<()> {
        let mut state = self.lock();
        if state.connection == ConnectionState::Connected {
            warn!("Description cannot change while connected");
            return Err(ClientError::ImmutableConfig {
                field: "description",
            });
        }
        if !description.is_empty() {
            state.config.description = state
                .overrides
                .description
                .clone()
                .unwrap_or_else(|| description.to_string());
        }
        Ok(())
    }

    /// Declare a publish channel; re-announces the config when connected
    pub fn add_publish(&self, declaration: ChannelDeclaration) {
        let mut state = self.lock();
        state.config.publish.messages.push(declaration);
        resync(&state);
    }

    /// Declare a subscribe channel; re-announces the config when connected
    pub fn add_subscribe(&self, declaration: ChannelDeclaration) {
        let mut state = self.lock();
        state.config.subscribe.messages.push(declaration);
        resync(&state);
    }

    // ------------------------------------------------------------------
    // Data messages
    // ------------------------------------------------------------------

    /// Send a value on one of this client's publish channels
    pub fn send(
        &self,
        name: &str,
        channel_type: impl Into<ChannelType>,
        value: impl Into<String>,
    ) -> Result<()> {
        let state = self.lock();
        let message = DataMessage::new(
            state.config.name.clone(),
            name,
            channel_type.into(),
            value,
        );
        state.enqueue(&Outbound::Message(message))
    }

    pub fn send_boolean(&self, name: &str, value: bool) -> Result<()> {
        self.send(name, ChannelType::Boolean, value.to_string())
    }

    pub fn send_range(&self, name: &str, value: f64) -> Result<()> {
        self.send(name, ChannelType::Range, value.to_string())
    }

    pub fn send_string(&self, name: &str, value: &str) -> Result<()> {
        self.send(name, ChannelType::String, value)
    }

    // ------------------------------------------------------------------
    // Admin registry
    // ------------------------------------------------------------------

    /// This client's address as seen by the router, once resolved
    pub fn self_address(&self) -> Option<String> {
        self.lock().admin.self_address().map(str::to_string)
    }

    pub fn is_admin(&self) -> bool {
        self.lock().admin.is_active()
    }

    /// Snapshot of every known remote client
    pub fn clients(&self) -> Vec<RemoteClient> {
        self.lock().admin.clients().to_vec()
    }

    pub fn get_client(&self, name: &str, remote_address: &str) -> Option<RemoteClient> {
        self.lock().admin.lookup(name, remote_address).cloned()
    }

    pub fn publish_list_by_type(&self, channel_type: &ChannelType) -> Vec<Endpoint> {
        self.lock()
            .admin
            .list_by_type(Direction::Publish, channel_type)
    }

    pub fn subscribe_list_by_type(&self, channel_type: &ChannelType) -> Vec<Endpoint> {
        self.lock()
            .admin
            .list_by_type(Direction::Subscribe, channel_type)
    }

    pub fn publish_type(
        &self,
        client_name: &str,
        remote_address: &str,
        channel: &str,
    ) -> Option<ChannelType> {
        self.lock().admin.resolve_channel_type(
            Direction::Publish,
            client_name,
            remote_address,
            channel,
        )
    }

    pub fn subscribe_type(
        &self,
        client_name: &str,
        remote_address: &str,
        channel: &str,
    ) -> Option<ChannelType> {
        self.lock().admin.resolve_channel_type(
            Direction::Subscribe,
            client_name,
            remote_address,
            channel,
        )
    }

    // ------------------------------------------------------------------
    // Routes
    // ------------------------------------------------------------------

    /// Snapshot of the routes this client has requested
    pub fn routes(&self) -> Vec<Route> {
        self.lock().routes.routes().to_vec()
    }

    /// Add or remove a route
    ///
    /// The request is sent even when the local cache already agrees.
    pub fn request_route(&self, op: RouteOp, target: RouteTarget) -> Result<()> {
        let mut state = self.lock();
        if state.connection != ConnectionState::Connected {
            return Err(ClientError::NotConnected);
        }

        let route = match target.into_route(&state.admin) {
            Ok(route) => route,
            Err(e) => {
                warn!("Unable to {} route: {}", op, e);
                return Err(e);
            }
        };

        let changed = state.routes.apply(op, &route);
        debug!(
            "Route {} {}:{} -> {}:{} (cache changed: {})",
            op,
            route.publisher.client_name,
            route.publisher.name,
            route.subscriber.client_name,
            route.subscriber.name,
            changed
        );

        state.enqueue(&Outbound::route(op, &route))
    }

    #[allow(clippy::too_many_arguments)]
    fn request_by_names(
        &self,
        op: RouteOp,
        pub_client: &str,
        pub_address: &str,
        pub_name: &str,
        sub_client: &str,
        sub_address: &str,
        sub_name: &str,
    ) -> Result<()> {
        self.request_route(
            op,
            RouteTarget::Channels {
                publisher: ChannelRef::new(pub_client, pub_address, pub_name),
                subscriber: ChannelRef::new(sub_client, sub_address, sub_name),
            },
        )
    }

    /// Route a publish channel to a subscribe channel, by name
    pub fn add_route(
        &self,
        pub_client: &str,
        pub_address: &str,
        pub_name: &str,
        sub_client: &str,
        sub_address: &str,
        sub_name: &str,
    ) -> Result<()> {
        self.request_by_names(
            RouteOp::Add,
            pub_client,
            pub_address,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        )
    }

    pub fn remove_route(
        &self,
        pub_client: &str,
        pub_address: &str,
        pub_name: &str,
        sub_client: &str,
        sub_address: &str,
        sub_name: &str,
    ) -> Result<()> {
        self.request_by_names(
            RouteOp::Remove,
            pub_client,
            pub_address,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        )
    }

    pub fn add_route_endpoints(&self, publisher: Endpoint, subscriber: Endpoint) -> Result<()> {
        self.request_route(
            RouteOp::Add,
            RouteTarget::Endpoints(Route::new(publisher, subscriber)),
        )
    }

    pub fn remove_route_endpoints(&self, publisher: Endpoint, subscriber: Endpoint) -> Result<()> {
        self.request_route(
            RouteOp::Remove,
            RouteTarget::Endpoints(Route::new(publisher, subscriber)),
        )
    }

    /// Route one of our publish channels to another client
    ///
    /// Does nothing until the own remote address is known.
    pub fn add_as_publisher_to(
        &self,
        pub_name: &str,
        sub_client: &str,
        sub_address: &str,
        sub_name: &str,
    ) -> Result<()> {
        self.own_route(
            RouteOp::Add,
            Direction::Publish,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        )
    }

    /// Route another client's publish channel to one of our subscribe channels
    ///
    /// Does nothing until the own remote address is known.
    pub fn add_as_subscriber_from(
        &self,
        sub_name: &str,
        pub_client: &str,
        pub_address: &str,
        pub_name: &str,
    ) -> Result<()> {
        self.own_route(
            RouteOp::Add,
            Direction::Subscribe,
            sub_name,
            pub_client,
            pub_address,
            pub_name,
        )
    }

    pub fn remove_as_publisher_to(
        &self,
        pub_name: &str,
        sub_client: &str,
        sub_address: &str,
        sub_name: &str,
    ) -> Result<()> {
        self.own_route(
            RouteOp::Remove,
            Direction::Publish,
            pub_name,
            sub_client,
            sub_address,
            sub_name,
        )
    }

    pub fn remove_as_subscriber_from(
        &self,
        sub_name: &str,
        pub_client: &str,
        pub_address: &str,
        pub_name: &str,
    ) -> Result<()> {
        self.own_route(
            RouteOp::Remove,
            Direction::Subscribe,
            sub_name,
            pub_client,
            pub_address,
            pub_name,
        )
    }

    /// Route between one of our channels (`own`) and a channel on another client
    fn own_route(
        &self,
        op: RouteOp,
        side: Direction,
        own: &str,
        other_client: &str,
        other_address: &str,
        other_name: &str,
    ) -> Result<()> {
        let (name, address) = {
            let state = self.lock();
            match state.admin.self_address() {
                Some(address) => (state.config.name.clone(), address.to_string()),
                None => {
                    debug!("Own remote address unresolved, skipping route {}", op);
                    return Ok(());
                }
            }
        };

        let ours = ChannelRef::new(name, address, own);
        let theirs = ChannelRef::new(other_client, other_address, other_name);
        let target = match side {
            Direction::Publish => RouteTarget::Channels {
                publisher: ours,
                subscriber: theirs,
            },
            Direction::Subscribe => RouteTarget::Channels {
                publisher: theirs,
                subscriber: ours,
            },
        };
        self.request_route(op, target)
    }
}

/// Re-announce after a channel declaration; silent while disconnected
fn resync(state: &ClientState) {
    if state.connection != ConnectionState::Connected {
        return;
    }
    if let Err(e) = state.sync_config() {
        error!("Config sync failed: {}", e);
    }
}

fn on_open(shared: &Shared, session: u64) {
    let name = {
        let mut state = shared.state.lock();
        if state.session != session || state.connection != ConnectionState::Connecting {
            return;
        }
        state.connection = ConnectionState::Connected;
        if let Err(e) = state.sync_config() {
            error!("Config sync failed: {}", e);
        }
        state.config.name.clone()
    };

    info!("Spacebrew connection opened, client name is: {}", name);
    shared.handlers.open();
}

fn on_closed(shared: &Shared, session: u64) {
    {
        let mut state = shared.state.lock();
        if state.session != session {
            debug!("Ignoring close from stale session {}", session);
            return;
        }
        state.connection = ConnectionState::Disconnected;
        state.outbound = None;
        // Report each session's close once
        state.session += 1;
    }

    info!("Spacebrew connection closed");
    shared.handlers.close();
}
