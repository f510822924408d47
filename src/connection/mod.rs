//! Connection handling
//!
//! - `uri`: connection string parsing and redaction
//! - `config`: where the connection string comes from
//! - `connector`: opening a `Database` through a driver

mod config;
mod connector;
mod uri;

pub use config::{ConnectionConfig, URI_ENV_VAR};
pub use connector::{connect, connect_with_config, Connector};
pub use uri::{ConnectionString, HostAddr, Scheme, DEFAULT_PORT};
