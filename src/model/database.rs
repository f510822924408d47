//! Database handle
//!
//! Returned by the connector and threaded through callers explicitly.
//! Holds the backend, the registered model schemas and the logger.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::connection::ConnectionString;
use crate::error::{DbError, DbResult};
use crate::observability::{Event, Logger};
use crate::schema::{HookPoint, ModelSchema};
use crate::store::{MemoryStore, StorageBackend};

use super::model::Model;

struct DatabaseInner {
    name: String,
    uri: Option<ConnectionString>,
    backend: Arc<dyn StorageBackend>,
    models: RwLock<HashMap<String, Arc<ModelSchema>>>,
    logger: Logger,
}

/// Handle to an open database. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Wrap an already opened backend
    pub fn new(name: impl Into<String>, backend: Arc<dyn StorageBackend>, logger: Logger) -> Self {
        Self::build(name.into(), None, backend, logger)
    }

    /// Fresh in-memory database logging to stdout
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(MemoryStore::new()), Logger::stdout())
    }

    pub(crate) fn connected(
        name: String,
        uri: ConnectionString,
        backend: Arc<dyn StorageBackend>,
        logger: Logger,
    ) -> Self {
        Self::build(name, Some(uri), backend, logger)
    }

    fn build(
        name: String,
        uri: Option<ConnectionString>,
        backend: Arc<dyn StorageBackend>,
        logger: Logger,
    ) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name,
                uri,
                backend,
                models: RwLock::new(HashMap::new()),
                logger,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Connection string this handle was opened with, if any
    pub fn uri(&self) -> Option<&ConnectionString> {
        self.inner.uri.as_ref()
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.inner.backend
    }

    /// Round-trip to the server behind this handle
    pub async fn ping(&self) -> DbResult<()> {
        self.inner.backend.ping().await
    }

    pub fn logger(&self) -> &Logger {
        &self.inner.logger
    }

    /// Register a schema and return its model.
    ///
    /// Hooks must be installed on the schema before this call; the
    /// registered schema is shared read-only.
    pub fn register(&self, schema: ModelSchema) -> DbResult<Model> {
        let name = schema.name().to_string();
        let mut models = self
            .inner
            .models
            .write()
            .map_err(|e| DbError::storage(e.to_string()))?;

        if models.contains_key(&name) {
            return Err(DbError::validation(name, "model already registered"));
        }

        for point in HookPoint::ALL {
            for hook in schema.hooks().hooks_for(point) {
                self.inner.logger.event(
                    Event::HookInstalled,
                    &[
                        ("model", name.as_str()),
                        ("point", point.as_str()),
                        ("hook", hook.name()),
                    ],
                );
            }
        }

        let schema = Arc::new(schema);
        models.insert(name, schema.clone());
        Ok(Model::new(schema, self.clone()))
    }

    /// Look up a registered model by name
    pub fn model(&self, name: &str) -> DbResult<Model> {
        let models = self
            .inner
            .models
            .read()
            .map_err(|e| DbError::storage(e.to_string()))?;

        let schema = models
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::UnknownModel(name.to_string()))?;
        Ok(Model::new(schema, self.clone()))
    }

    /// Registered model names, sorted
    pub fn model_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .models
            .read()
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("uri", &self.inner.uri.as_ref().map(ConnectionString::redacted))
            .field("models", &self.model_names())
            .finish()
    }
}
