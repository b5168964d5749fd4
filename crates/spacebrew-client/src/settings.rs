//! Client settings and parameter overrides
//!
//! Settings come from the embedding application. Overrides model the
//! externally supplied `server`, `port`, `name` and `description`
//! parameters (query string or environment); when present they win over
//! the application's values.

use spacebrew_core::{DEFAULT_DESCRIPTION, DEFAULT_NAME, DEFAULT_PORT, DEFAULT_SERVER};

/// Environment variable prefix used by [`Overrides::from_env`]
pub const ENV_PREFIX: &str = "SPACEBREW_";

/// Connection and identity settings for a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Router host
    pub server: String,
    /// Router port
    pub port: u16,
    /// Client name announced to the router
    pub name: String,
    /// Client description announced to the router
    pub description: String,
    /// Request admin privileges after connecting
    pub admin: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            port: DEFAULT_PORT,
            name: DEFAULT_NAME.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            admin: false,
        }
    }
}

impl ClientSettings {
    pub fn new(server: &str, name: &str, description: &str) -> Self {
        Self {
            server: server.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    /// WebSocket URL of the router
    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.server, self.port)
    }

    /// Apply overrides; a port override is used only when numeric
    pub fn apply(mut self, overrides: &Overrides) -> Self {
        if let Some(server) = &overrides.server {
            self.server = server.clone();
        }
        if let Some(port) = overrides.port() {
            self.port = port;
        }
        if let Some(name) = &overrides.name {
            self.name = name.clone();
        }
        if let Some(description) = &overrides.description {
            self.description = description.clone();
        }
        self
    }
}

/// Externally supplied parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub server: Option<String>,
    pub port: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Overrides {
    /// No overrides
    pub fn none() -> Self {
        Self::default()
    }

    /// Parse a query string (`a=b&c=d`, `?a=b` or a full URL)
    ///
    /// Values are percent-decoded. The first occurrence of a key wins and
    /// empty values count as absent.
    pub fn from_query(query: &str) -> Self {
        let query = match query.split_once('?') {
            Some((_, rest)) => rest,
            None => query,
        };
        let query = query.split('#').next().unwrap_or_default();

        Self::from_pairs(
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        )
    }

    /// Read `SPACEBREW_SERVER`, `SPACEBREW_PORT`, `SPACEBREW_NAME` and `SPACEBREW_DESCRIPTION`
    pub fn from_env() -> Self {
        Self::from_pairs(["server", "port", "name", "description"].into_iter().filter_map(
            |key| {
                std::env::var(format!("{}{}", ENV_PREFIX, key.to_uppercase()))
                    .ok()
                    .map(|value| (key.to_string(), value))
            },
        ))
    }

    /// Build from key/value pairs, ignoring unknown keys
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut overrides = Self::default();
        for (key, value) in pairs {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "server" => &mut overrides.server,
                "port" => &mut overrides.port,
                "name" => &mut overrides.name,
                "description" => &mut overrides.description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        overrides
    }

    /// Port override, if it parses as a number
    pub fn port(&self) -> Option<u16> {
        self.port.as_deref().and_then(|p| p.trim().parse().ok())
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
