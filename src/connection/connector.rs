//! Connector
//!
//! Resolves a connection string, opens it through a `Driver` and hands
//! back an explicit `Database` handle. Success and failure are both
//! logged; failures are also returned. There are no retries.

use std::fmt;
use std::sync::Arc;

use crate::error::DbResult;
use crate::model::Database;
use crate::observability::{Event, Logger};
use crate::store::Driver;

use super::config::ConnectionConfig;
use super::uri::ConnectionString;

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Opens databases through a driver
#[derive(Clone)]
pub struct Connector {
    driver: Arc<dyn Driver>,
    logger: Logger,
    lookup: EnvLookup,
}

impl Connector {
    /// Connector reading the process environment and logging to stdout
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver,
            logger: Logger::stdout(),
            lookup: Arc::new(|key: &str| std::env::var(key).ok()),
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    /// Replace the environment lookup
    pub fn with_env_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.lookup = Arc::new(lookup);
        self
    }

    /// Config for `name`, honouring the environment override
    pub fn config_for(&self, name: &str) -> ConnectionConfig {
        ConnectionConfig::from_lookup(name, |key| (self.lookup)(key))
    }

    /// Connect to the logical database `name`
    pub async fn connect(&self, name: &str) -> DbResult<Database> {
        let config = self.config_for(name);
        self.connect_with_config(&config).await
    }

    /// Connect with an explicit configuration
    pub async fn connect_with_config(&self, config: &ConnectionConfig) -> DbResult<Database> {
        match self.open(config).await {
            Ok(db) => {
                let host = db.uri().map(ConnectionString::redacted).unwrap_or_default();
                self.logger.event(
                    Event::ConnectionOpen,
                    &[("database", db.name()), ("uri", host.as_str())],
                );
                Ok(db)
            }
            Err(e) => {
                let error = e.to_string();
                self.logger.event(
                    Event::ConnectionError,
                    &[("database", config.database.as_str()), ("error", error.as_str())],
                );
                Err(e)
            }
        }
    }

    async fn open(&self, config: &ConnectionConfig) -> DbResult<Database> {
        let uri = ConnectionString::parse(&config.resolve_uri())?;
        let name = uri
            .database
            .clone()
            .unwrap_or_else(|| config.database.clone());
        let backend = self.driver.open(&uri, &name).await?;
        Ok(Database::connected(name, uri, backend, self.logger.clone()))
    }
}

impl fmt::Debug for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

/// Connect to `name` using the process environment
pub async fn connect(name: &str, driver: Arc<dyn Driver>) -> DbResult<Database> {
    Connector::new(driver).connect(name).await
}

/// Connect with an explicit configuration, bypassing the environment
pub async fn connect_with_config(
    config: &ConnectionConfig,
    driver: Arc<dyn Driver>,
) -> DbResult<Database> {
    Connector::new(driver).connect_with_config(config).await
}
