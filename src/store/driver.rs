//! Drivers open storage backends for a connection string

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use crate::connection::ConnectionString;
use crate::error::{DbError, DbResult};

use super::backend::{MemoryStore, StorageBackend};

/// Future returned by [`Driver::open`]
pub type OpenFuture<'a> =
    Pin<Box<dyn Future<Output = DbResult<Arc<dyn StorageBackend>>> + Send + 'a>>;

/// Opens a backend for a parsed connection string.
///
/// `database` is the resolved database name: the URI path when present,
/// otherwise the logical name the caller asked for. A driver only returns
/// `Ok` once the server has answered.
pub trait Driver: Send + Sync {
    /// Short name used in logs and CLI output
    fn name(&self) -> &str;

    fn open<'a>(&'a self, uri: &'a ConnectionString, database: &'a str) -> OpenFuture<'a>;
}

/// Driver serving in-memory stores.
///
/// Each distinct host list and database pair gets its own store; opening
/// the same pair again returns the same store.
#[derive(Default)]
pub struct MemoryDriver {
    stores: RwLock<HashMap<String, Arc<MemoryStore>>>,
    refused_hosts: HashSet<String>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse connections to `host`, as an unreachable server would
    pub fn refuse_host(mut self, host: impl Into<String>) -> Self {
        self.refused_hosts.insert(host.into());
        self
    }

    fn store_for(&self, key: String) -> DbResult<Arc<MemoryStore>> {
        let mut stores = self
            .stores
            .write()
            .map_err(|e| DbError::storage(e.to_string()))?;
        Ok(stores.entry(key).or_default().clone())
    }
}

impl Driver for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    fn open<'a>(&'a self, uri: &'a ConnectionString, database: &'a str) -> OpenFuture<'a> {
        Box::pin(async move {
            if let Some(host) = uri.hosts.iter().find(|h| self.refused_hosts.contains(&h.host)) {
                return Err(DbError::connection(format!(
                    "connection refused by {}",
                    host
                )));
            }

            let key = format!("{}/{}", uri.host_list(), database);
            let store: Arc<dyn StorageBackend> = self.store_for(key)?;
            Ok(store)
        })
    }
}
