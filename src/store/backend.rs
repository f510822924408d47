//! Storage backend trait and the in-memory implementation
//!
//! The backend owns stored documents. Callers receive copies marked as
//! stored (`is_new() == false`). Every method returns a boxed future so
//! network drivers can implement the trait without blocking.

use std::collections::{BTreeMap, HashMap};
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::RwLock;

use crate::document::{Document, DocumentId};
use crate::error::{DbError, DbResult};

use super::filter::Filter;
use super::update::UpdatePayload;

/// Future returned by [`StorageBackend`] methods
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = DbResult<T>> + Send + 'a>>;

/// Trait for the storage backend
pub trait StorageBackend: Send + Sync {
    /// Insert a document, assigning an identity when it has none
    fn insert<'a>(&'a self, collection: &'a str, document: Document) -> StoreFuture<'a, Document>;

    /// Replace a stored document with the same identity
    fn replace<'a>(&'a self, collection: &'a str, document: Document)
        -> StoreFuture<'a, Document>;

    /// Documents matching `filter`, in identity order
    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<Document>>;

    /// Number of documents matching `filter`
    fn count<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, u64>;

    /// Apply an update to one document; `None` when it does not exist
    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        update: &'a UpdatePayload,
    ) -> StoreFuture<'a, Option<Document>>;

    /// Round-trip to the server; fails when it cannot be reached
    fn ping(&self) -> StoreFuture<'_, ()>;
}

type Collection = BTreeMap<DocumentId, Document>;

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of collections holding at least one document
    pub fn collections(&self) -> DbResult<Vec<String>> {
        let data = self.data.read().map_err(poisoned)?;
        let mut names: Vec<String> = data
            .iter()
            .filter(|(_, c)| !c.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    fn insert_now(&self, collection: &str, mut document: Document) -> DbResult<Document> {
        let id = document.ensure_id().clone();
        let mut data = self.data.write().map_err(poisoned)?;
        let coll = data.entry(collection.to_string()).or_default();

        if coll.contains_key(&id) {
            return Err(DbError::storage(format!(
                "duplicate key {} in {}",
                id, collection
            )));
        }

        let document = stored(document);
        coll.insert(id, document.clone());
        Ok(document)
    }

    fn replace_now(&self, collection: &str, document: Document) -> DbResult<Document> {
        let id = document
            .id()
            .cloned()
            .ok_or_else(|| DbError::storage("cannot replace a document without identity"))?;
        let mut data = self.data.write().map_err(poisoned)?;

        let slot = data
            .get_mut(collection)
            .and_then(|c| c.get_mut(&id))
            .ok_or_else(|| DbError::not_found(format!("document {} in {}", id, collection)))?;

        let document = stored(document);
        *slot = document.clone();
        Ok(document)
    }

    fn find_now(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> DbResult<Vec<Document>> {
        let data = self.data.read().map_err(poisoned)?;

        let results = data
            .get(collection)
            .map(|c| {
                c.values()
                    .filter(|doc| filter.matches(doc))
                    .take(limit.unwrap_or(usize::MAX))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(results)
    }

    fn count_now(&self, collection: &str, filter: &Filter) -> DbResult<u64> {
        let data = self.data.read().map_err(poisoned)?;

        let n = data
            .get(collection)
            .map(|c| c.values().filter(|doc| filter.matches(doc)).count())
            .unwrap_or(0);

        Ok(n as u64)
    }

    fn update_now(
        &self,
        collection: &str,
        id: &DocumentId,
        update: &UpdatePayload,
    ) -> DbResult<Option<Document>> {
        let mut data = self.data.write().map_err(poisoned)?;

        let Some(doc) = data.get_mut(collection).and_then(|c| c.get_mut(id)) else {
            return Ok(None);
        };

        // Apply to a copy so a rejected payload leaves the stored document intact
        let mut updated = doc.clone();
        update.apply_to(&mut updated)?;
        *doc = updated.clone();

        Ok(Some(updated))
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> DbError {
    DbError::storage(e.to_string())
}

fn stored(mut doc: Document) -> Document {
    doc.mark_stored();
    doc
}

// Work happens before the future is built; lock guards never cross an await
fn ready<'a, T: Send + 'a>(result: DbResult<T>) -> StoreFuture<'a, T> {
    Box::pin(future::ready(result))
}

impl StorageBackend for MemoryStore {
    fn insert<'a>(&'a self, collection: &'a str, document: Document) -> StoreFuture<'a, Document> {
        ready(self.insert_now(collection, document))
    }

    fn replace<'a>(
        &'a self,
        collection: &'a str,
        document: Document,
    ) -> StoreFuture<'a, Document> {
        ready(self.replace_now(collection, document))
    }

    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<Document>> {
        ready(self.find_now(collection, filter, limit))
    }

    fn count<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, u64> {
        ready(self.count_now(collection, filter))
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        update: &'a UpdatePayload,
    ) -> StoreFuture<'a, Option<Document>> {
        ready(self.update_now(collection, id, update))
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        ready(Ok(()))
    }
}
