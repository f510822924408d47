//! MongoDB driver and backend
//!
//! `MongoDriver` builds a client from the connection string and only
//! hands back a backend after the server has answered a `ping`. Documents
//! go through `codec` on the way in and out.

use std::time::Duration;

use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document as BsonDocument};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{ClientOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::{Client, Collection, Database as MongoDatabase};

use crate::connection::ConnectionString;
use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{DbError, DbResult};

use super::backend::{StorageBackend, StoreFuture};
use super::codec::{filter_document, from_bson_document, to_bson_document, update_document};
use super::driver::{Driver, OpenFuture};
use super::filter::Filter;
use super::update::UpdatePayload;

/// Driver for MongoDB servers
#[derive(Debug, Clone, Default)]
pub struct MongoDriver {
    server_selection_timeout: Option<Duration>,
    app_name: Option<String>,
}

impl MongoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// How long to wait for a reachable server when the URI does not say
    pub fn with_server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    async fn connect(&self, uri: &ConnectionString, database: &str) -> DbResult<MongoStore> {
        let mut options = ClientOptions::parse(uri.to_uri())
            .await
            .map_err(|e| DbError::invalid_uri(uri.redacted(), e.to_string()))?;
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout = self.server_selection_timeout;
        }
        if self.app_name.is_some() {
            options.app_name = self.app_name.clone();
        }

        let client = Client::with_options(options).map_err(mongo_error)?;
        let store = MongoStore {
            db: client.database(database),
        };
        store.ping_server().await?;
        Ok(store)
    }
}

impl Driver for MongoDriver {
    fn name(&self) -> &str {
        "mongodb"
    }

    fn open<'a>(&'a self, uri: &'a ConnectionString, database: &'a str) -> OpenFuture<'a> {
        Box::pin(async move {
            let store = self.connect(uri, database).await?;
            let backend: std::sync::Arc<dyn StorageBackend> = std::sync::Arc::new(store);
            Ok(backend)
        })
    }
}

/// Backend over one MongoDB database
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: MongoDatabase,
}

impl MongoStore {
    /// Wrap an existing client database handle
    pub fn new(db: MongoDatabase) -> Self {
        Self { db }
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db.collection::<BsonDocument>(name)
    }

    async fn ping_server(&self) -> DbResult<()> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(mongo_error)?;
        Ok(())
    }
}

fn id_filter(id: &DocumentId) -> BsonDocument {
    doc! { ID_FIELD: id.as_str() }
}

/// Unreachable servers map to `Connection`, everything else to `Storage`
pub fn mongo_error(e: MongoError) -> DbError {
    match e.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::DnsResolve { .. } | ErrorKind::Io(_) => {
            DbError::connection(e.to_string())
        }
        ErrorKind::Authentication { .. } => DbError::connection(e.to_string()),
        _ => DbError::storage(e.to_string()),
    }
}

impl StorageBackend for MongoStore {
    fn insert<'a>(&'a self, collection: &'a str, mut document: Document) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            document.ensure_id();
            self.collection(collection)
                .insert_one(to_bson_document(&document), None)
                .await
                .map_err(mongo_error)?;
            document.mark_stored();
            Ok(document)
        })
    }

    fn replace<'a>(
        &'a self,
        collection: &'a str,
        mut document: Document,
    ) -> StoreFuture<'a, Document> {
        Box::pin(async move {
            let id = document
                .id()
                .cloned()
                .ok_or_else(|| DbError::storage("cannot replace a document without identity"))?;
            let result = self
                .collection(collection)
                .replace_one(id_filter(&id), to_bson_document(&document), None)
                .await
                .map_err(mongo_error)?;
            if result.matched_count == 0 {
                return Err(DbError::not_found(format!("document {} in {}", id, collection)));
            }
            document.mark_stored();
            Ok(document)
        })
    }

    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<Document>> {
        Box::pin(async move {
            let mut options = FindOptions::default();
            options.sort = Some(doc! { ID_FIELD: 1 });
            options.limit = limit.map(|n| i64::try_from(n).unwrap_or(i64::MAX));

            let cursor = self
                .collection(collection)
                .find(filter_document(filter), options)
                .await
                .map_err(mongo_error)?;
            let raw: Vec<BsonDocument> = cursor.try_collect().await.map_err(mongo_error)?;
            Ok(raw.into_iter().map(from_bson_document).collect())
        })
    }

    fn count<'a>(&'a self, collection: &'a str, filter: &'a Filter) -> StoreFuture<'a, u64> {
        Box::pin(async move {
            self.collection(collection)
                .count_documents(filter_document(filter), None)
                .await
                .map_err(mongo_error)
        })
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        update: &'a UpdatePayload,
    ) -> StoreFuture<'a, Option<Document>> {
        Box::pin(async move {
            if update.touches(ID_FIELD) {
                return Err(DbError::validation(ID_FIELD, "identity cannot be updated"));
            }
            let coll = self.collection(collection);

            let Some(modifications) = update_document(update) else {
                let current = coll.find_one(id_filter(id), None).await.map_err(mongo_error)?;
                return Ok(current.map(from_bson_document));
            };

            let mut options = FindOneAndUpdateOptions::default();
            options.return_document = Some(ReturnDocument::After);
            let updated = coll
                .find_one_and_update(id_filter(id), modifications, options)
                .await
                .map_err(mongo_error)?;
            Ok(updated.map(from_bson_document))
        })
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.ping_server())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable() -> ConnectionString {
        ConnectionString::parse("mongodb://no-such-host.invalid:1/shop").unwrap()
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connection_error() {
        let driver = MongoDriver::new().with_server_selection_timeout(Duration::from_millis(200));
        let err = driver.open(&unreachable(), "shop").await.err().unwrap();
        assert!(matches!(err, DbError::Connection(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_uri_timeout_option_is_honoured() {
        let uri = ConnectionString::parse(
            "mongodb://no-such-host.invalid:1/shop?serverSelectionTimeoutMS=200",
        )
        .unwrap();
        let err = MongoDriver::new().open(&uri, "shop").await.err().unwrap();
        assert!(matches!(err, DbError::Connection(_)));
    }

    #[test]
    fn test_io_failure_is_a_connection_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(mongo_error(MongoError::from(io)), DbError::Connection(_)));
    }

    #[test]
    fn test_driver_name() {
        assert_eq!(MongoDriver::new().name(), "mongodb");
    }
}
