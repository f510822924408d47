//! Connection configuration
//!
//! Resolution order for the connection string:
//! 1. explicit `uri` in the config
//! 2. `MONGODB_URI` environment variable
//! 3. `mongodb://{host}:{port}/{database}`

use serde::{Deserialize, Serialize};

use super::uri::DEFAULT_PORT;

/// Environment variable overriding the connection string
pub const URI_ENV_VAR: &str = "MONGODB_URI";

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Logical database name
    pub database: String,

    /// Full connection string; wins over host/port when set
    #[serde(default)]
    pub uri: Option<String>,

    /// Host for the derived default (default: "localhost")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port for the derived default (default: 27017)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl ConnectionConfig {
    /// Local default config for a logical database name
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            uri: None,
            host: default_host(),
            port: default_port(),
        }
    }

    /// Config picking up `MONGODB_URI` from the process environment
    pub fn from_env(database: impl Into<String>) -> Self {
        Self::from_lookup(database, |key| std::env::var(key).ok())
    }

    /// Config resolved through a custom variable lookup
    pub fn from_lookup<F>(database: impl Into<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup(URI_ENV_VAR).filter(|v| !v.trim().is_empty());
        Self {
            uri,
            ..Self::new(database)
        }
    }

    /// Override the connection string
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Connection string derived from host, port and database
    pub fn default_uri(&self) -> String {
        format!("mongodb://{}:{}/{}", self.host, self.port, self.database)
    }

    /// The connection string to open
    pub fn resolve_uri(&self) -> String {
        self.uri.clone().unwrap_or_else(|| self.default_uri())
    }
}
