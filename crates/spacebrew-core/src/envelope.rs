//! Wire envelopes
//!
//! Every frame is a single JSON document whose meaning depends on which
//! top-level keys it carries. Inbound frames are classified once, here,
//! into an [`Envelope`]; outbound frames are built from [`Outbound`].
//!
//! Classification order for inbound frames:
//! 1. `message` - end-user data
//! 2. `admin` - registration acknowledgement
//! 3. `remove` - clients that left the router
//! 4. `route` - route added or removed
//! 5. `config` (bare object) or an array of `{"config": ...}` - client announcements
//!
//! Missing or mistyped fields inside a matched branch decode to empty values
//! rather than failing the whole frame.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{
    lenient_field, ClientConfig, DataMessage, Endpoint, RemoteClient, Route, RouteOp,
};

/// A client that disconnected from the router
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemovedClient {
    #[serde(deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(deserialize_with = "lenient_field")]
    pub remote_address: String,
}

/// Route change pushed by the router
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteUpdate {
    /// `add` or `remove`, passed through as sent
    #[serde(rename = "type", deserialize_with = "lenient_field")]
    pub kind: String,
    #[serde(alias = "publisher", deserialize_with = "lenient_field")]
    pub publish: Option<Endpoint>,
    #[serde(alias = "subscriber", deserialize_with = "lenient_field")]
    pub subscribe: Option<Endpoint>,
}

/// Classified inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// End-user data
    Message(DataMessage),
    /// Admin registration acknowledgement, carries no state
    Admin(Value),
    /// Clients that left
    Remove(Vec<RemovedClient>),
    /// Route change
    Route(RouteUpdate),
    /// One or many client configuration announcements
    Configs(Vec<RemoteClient>),
    /// JSON object or value with none of the known keys
    Unrecognized(Value),
}

impl Envelope {
    /// Classify a parsed JSON frame
    pub fn classify(frame: Value) -> Envelope {
        match frame {
            Value::Object(mut map) => {
                if let Some(message) = take_key(&mut map, "message") {
                    return Envelope::Message(lenient(message));
                }
                if let Some(admin) = take_key(&mut map, "admin") {
                    return Envelope::Admin(admin);
                }
                if let Some(remove) = take_key(&mut map, "remove") {
                    return Envelope::Remove(removed_clients(remove));
                }
                if let Some(route) = take_key(&mut map, "route") {
                    return Envelope::Route(lenient(route));
                }
                if let Some(config) = take_key(&mut map, "config") {
                    return Envelope::Configs(remote_client(config).into_iter().collect());
                }
                Envelope::Unrecognized(Value::Object(map))
            }
            Value::Array(items) => Envelope::Configs(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::Object(mut map) => take_key(&mut map, "config"),
                        _ => None,
                    })
                    .filter_map(remote_client)
                    .collect(),
            ),
            other => Envelope::Unrecognized(other),
        }
    }

    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::Message(_) => "message",
            Envelope::Admin(_) => "admin",
            Envelope::Remove(_) => "remove",
            Envelope::Route(_) => "route",
            Envelope::Configs(_) => "config",
            Envelope::Unrecognized(_) => "unrecognized",
        }
    }
}

/// A present, non-null key
fn take_key(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

fn lenient<T: Default + DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_default()
}

fn removed_clients(value: Value) -> Vec<RemovedClient> {
    match value {
        Value::Array(items) => items.into_iter().map(lenient).collect(),
        other => vec![lenient(other)],
    }
}

fn remote_client(value: Value) -> Option<RemoteClient> {
    serde_json::from_value(value).ok()
}

/// Admin registration payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRequest {
    pub admin: bool,
}

/// Route request sent by this client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRequest {
    #[serde(rename = "type")]
    pub op: RouteOp,
    pub publisher: Endpoint,
    pub subscriber: Endpoint,
}

/// Outbound frame, serialized as `{"<kind>": payload}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outbound {
    Config(ClientConfig),
    Admin(Vec<AdminRequest>),
    Message(DataMessage),
    Route(RouteRequest),
}

impl Outbound {
    /// `{"admin":[{"admin":true}]}`
    pub fn admin_registration() -> Self {
        Outbound::Admin(vec![AdminRequest { admin: true }])
    }

    pub fn route(op: RouteOp, route: &Route) -> Self {
        Outbound::Route(RouteRequest {
            op,
            publisher: route.publisher.clone(),
            subscriber: route.subscriber.clone(),
        })
    }
}
