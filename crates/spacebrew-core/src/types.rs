//! Protocol types: channels, client configurations, routes and data messages

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Type tag of a publish or subscribe channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelType {
    Boolean,
    Range,
    String,
    /// Any application-defined tag
    Custom(String),
}

impl ChannelType {
    pub fn parse(tag: &str) -> Self {
        match tag {
            "boolean" => ChannelType::Boolean,
            "range" => ChannelType::Range,
            "string" => ChannelType::String,
            other => ChannelType::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ChannelType::Boolean => "boolean",
            ChannelType::Range => "range",
            ChannelType::String => "string",
            ChannelType::Custom(tag) => tag,
        }
    }
}

/// A missing tag reads as an empty custom tag
impl Default for ChannelType {
    fn default() -> Self {
        ChannelType::Custom(String::new())
    }
}

impl From<&str> for ChannelType {
    fn from(tag: &str) -> Self {
        ChannelType::parse(tag)
    }
}

impl From<String> for ChannelType {
    fn from(tag: String) -> Self {
        ChannelType::parse(&tag)
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChannelType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(ChannelType::parse(&tag))
    }
}

/// Publish or subscribe side of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Publish,
    Subscribe,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Publish => "publish",
            Direction::Subscribe => "subscribe",
        }
    }
}

/// A named, typed channel declared by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelDeclaration {
    #[serde(default, deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_field")]
    pub channel_type: ChannelType,
    /// Initial value, publish declarations only
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub default: Option<String>,
}

impl ChannelDeclaration {
    /// Create a publish declaration
    pub fn publish(
        name: impl Into<String>,
        channel_type: impl Into<ChannelType>,
        default: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            channel_type: channel_type.into(),
            default,
        }
    }

    /// Create a subscribe declaration
    pub fn subscribe(name: impl Into<String>, channel_type: impl Into<ChannelType>) -> Self {
        Self {
            name: name.into(),
            channel_type: channel_type.into(),
            default: None,
        }
    }

    /// Same name and type, ignoring the default value
    pub fn same_shape(&self, other: &ChannelDeclaration) -> bool {
        self.name == other.name && self.channel_type == other.channel_type
    }
}

/// Ordered channel list, wrapped as `{"messages": [...]}` on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelList {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub messages: Vec<ChannelDeclaration>,
}

impl ChannelList {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChannelDeclaration> {
        self.messages.iter()
    }

    /// Lengths equal and every index has the same name and type
    pub fn same_shape(&self, other: &ChannelList) -> bool {
        self.len() == other.len()
            && self
                .messages
                .iter()
                .zip(&other.messages)
                .all(|(a, b)| a.same_shape(b))
    }
}

/// Local client configuration announced to the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub name: String,
    pub description: String,
    pub publish: ChannelList,
    pub subscribe: ChannelList,
}

impl ClientConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            publish: ChannelList::default(),
            subscribe: ChannelList::default(),
        }
    }

    pub fn channels(&self, direction: Direction) -> &ChannelList {
        match direction {
            Direction::Publish => &self.publish,
            Direction::Subscribe => &self.subscribe,
        }
    }
}

/// Another client as announced by the router
///
/// Identity key is `(name, remote_address)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteClient {
    #[serde(deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(deserialize_with = "lenient_field")]
    pub remote_address: String,
    #[serde(deserialize_with = "lenient_field")]
    pub description: String,
    #[serde(deserialize_with = "lenient_field")]
    pub publish: ChannelList,
    #[serde(deserialize_with = "lenient_field")]
    pub subscribe: ChannelList,
}

impl RemoteClient {
    pub fn is(&self, name: &str, remote_address: &str) -> bool {
        self.name == name && self.remote_address == remote_address
    }

    pub fn channels(&self, direction: Direction) -> &ChannelList {
        match direction {
            Direction::Publish => &self.publish,
            Direction::Subscribe => &self.subscribe,
        }
    }

    /// True if this announcement has the local client's name and exact channel shape
    pub fn mirrors(&self, local: &ClientConfig) -> bool {
        self.name == local.name
            && self.publish.same_shape(&local.publish)
            && self.subscribe.same_shape(&local.subscribe)
    }

    /// Declared type of a channel, if present
    pub fn channel_type(&self, direction: Direction, channel: &str) -> Option<&ChannelType> {
        self.channels(direction)
            .iter()
            .find(|decl| decl.name == channel)
            .map(|decl| &decl.channel_type)
    }
}

/// One side of a route: a specific channel on a specific client
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    #[serde(deserialize_with = "lenient_field")]
    pub client_name: String,
    #[serde(deserialize_with = "lenient_field")]
    pub remote_address: String,
    #[serde(deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_field"
    )]
    pub channel_type: Option<ChannelType>,
}

impl Endpoint {
    pub fn new(
        client_name: impl Into<String>,
        remote_address: impl Into<String>,
        name: impl Into<String>,
        channel_type: Option<ChannelType>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            remote_address: remote_address.into(),
            name: name.into(),
            channel_type,
        }
    }

    /// All four fields present
    pub fn is_complete(&self) -> bool {
        !self.client_name.is_empty()
            && !self.remote_address.is_empty()
            && !self.name.is_empty()
            && self.channel_type.is_some()
    }
}

/// Directed binding from a publish channel to a subscribe channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub publisher: Endpoint,
    pub subscriber: Endpoint,
}

impl Route {
    pub fn new(publisher: Endpoint, subscriber: Endpoint) -> Self {
        Self {
            publisher,
            subscriber,
        }
    }
}

/// Route request operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteOp {
    Add,
    Remove,
}

impl RouteOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteOp::Add => "add",
            RouteOp::Remove => "remove",
        }
    }
}

impl fmt::Display for RouteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End-user data message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DataMessage {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient_field")]
    pub client_name: Option<String>,
    #[serde(deserialize_with = "lenient_field")]
    pub name: String,
    #[serde(
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_field"
    )]
    pub channel_type: Option<ChannelType>,
    pub value: serde_json::Value,
}

/// A data message value coerced according to its channel type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Boolean(bool),
    Range(f64),
    String(String),
    Custom { value: String, channel_type: String },
}

impl DataMessage {
    /// Outbound message from this client
    pub fn new(
        client_name: impl Into<String>,
        name: impl Into<String>,
        channel_type: ChannelType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            client_name: Some(client_name.into()),
            name: name.into(),
            channel_type: Some(channel_type),
            value: serde_json::Value::String(value.into()),
        }
    }

    /// Coerce the raw value by channel type; unknown or missing types become `Custom`
    pub fn typed_value(&self) -> TypedValue {
        match &self.channel_type {
            Some(ChannelType::Boolean) => TypedValue::Boolean(coerce_bool(&self.value)),
            Some(ChannelType::Range) => TypedValue::Range(coerce_number(&self.value)),
            Some(ChannelType::String) => TypedValue::String(value_text(&self.value)),
            other => TypedValue::Custom {
                value: value_text(&self.value),
                channel_type: other
                    .as_ref()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
            },
        }
    }
}

/// True only for the exact string `"true"`; JSON booleans and numbers read as false
fn coerce_bool(value: &serde_json::Value) -> bool {
    matches!(value, serde_json::Value::String(s) if s == "true")
}

fn coerce_number(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        serde_json::Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        serde_json::Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        serde_json::Value::Null => 0.0,
        _ => f64::NAN,
    }
}

/// String form of a JSON value; strings pass through unquoted
pub fn value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode one field on its own; a mistyped value becomes the field's default
pub(crate) fn lenient_field<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Decode a list element by element, skipping entries that are not objects of the right shape
pub(crate) fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(v) => Some(value_text(&v)),
    })
}
