//! Model: a registered schema bound to a database

use std::fmt;
use std::sync::Arc;

use crate::document::{Document, DocumentId};
use crate::error::{DbError, DbResult};
use crate::observability::Event;
use crate::schema::{check_structure, run_validators, HookPoint, ModelSchema, UpdateContext};
use crate::store::{Filter, UpdatePayload};

use super::database::Database;

/// Typed access to one collection.
///
/// Creates and saves run schema validation. The three update operations
/// run the schema's pre-update hooks first; a rejection leaves storage
/// untouched.
#[derive(Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    db: Database,
}

impl Model {
    pub(crate) fn new(schema: Arc<ModelSchema>, db: Database) -> Self {
        Self { schema, db }
    }

    pub fn name(&self) -> &str {
        self.schema.name()
    }

    pub fn collection(&self) -> &str {
        self.schema.collection()
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Check a document against the schema and run every field validator
    pub async fn validate(&self, doc: &Document) -> DbResult<()> {
        let result = match check_structure(&self.schema, doc) {
            Ok(()) => run_validators(&self.schema, &self.db, doc).await,
            Err(e) => Err(e),
        };

        if let Err(DbError::Validation { path, message }) = &result {
            self.db.logger().event(
                Event::ValidationFailed,
                &[
                    ("model", self.name()),
                    ("path", path.as_str()),
                    ("error", message.as_str()),
                ],
            );
        }
        result
    }

    /// Validate and insert a new document
    pub async fn create(&self, doc: Document) -> DbResult<Document> {
        self.validate(&doc).await?;
        self.db.backend().insert(self.collection(), doc).await
    }

    /// Insert a new document or replace a stored one, validating either way
    pub async fn save(&self, doc: Document) -> DbResult<Document> {
        if doc.is_new() {
            return self.create(doc).await;
        }
        self.validate(&doc).await?;
        self.db.backend().replace(self.collection(), doc).await
    }

    pub async fn find(&self, filter: &Filter) -> DbResult<Vec<Document>> {
        self.db.backend().find(self.collection(), filter, None).await
    }

    pub async fn find_one(&self, filter: &Filter) -> DbResult<Option<Document>> {
        let mut docs = self.db
            .backend()
            .find(self.collection(), filter, Some(1))
            .await?;
        Ok(docs.pop())
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> DbResult<Option<Document>> {
        self.find_one(&Filter::by_id(id)).await
    }

    pub async fn count_documents(&self, filter: &Filter) -> DbResult<u64> {
        self.db.backend().count(self.collection(), filter).await
    }

    /// Update the document with identity `id`; returns the updated document
    pub async fn find_by_id_and_update(
        &self,
        id: &DocumentId,
        update: &UpdatePayload,
    ) -> DbResult<Option<Document>> {
        let filter = Filter::by_id(id);
        self.intercept(HookPoint::FindByIdAndUpdate, &filter, update)
            .await?;
        self.db.backend().update(self.collection(), id, update).await
    }

    /// Update the first document matching `filter`
    pub async fn find_one_and_update(
        &self,
        filter: &Filter,
        update: &UpdatePayload,
    ) -> DbResult<Option<Document>> {
        self.intercept(HookPoint::FindOneAndUpdate, filter, update)
            .await?;

        let Some(id) = self.find_one(filter).await?.and_then(|d| d.id().cloned()) else {
            return Ok(None);
        };
        self.db.backend().update(self.collection(), &id, update).await
    }

    /// Update every document matching `filter`; returns how many changed
    pub async fn update_many(&self, filter: &Filter, update: &UpdatePayload) -> DbResult<u64> {
        self.intercept(HookPoint::UpdateMany, filter, update).await?;

        let mut modified = 0;
        for doc in self.find(filter).await? {
            let Some(id) = doc.id() else { continue };
            let updated = self.db.backend().update(self.collection(), id, update).await?;
            if updated.is_some() {
                modified += 1;
            }
        }
        Ok(modified)
    }

    async fn intercept(
        &self,
        point: HookPoint,
        filter: &Filter,
        update: &UpdatePayload,
    ) -> DbResult<()> {
        let ctx = UpdateContext {
            point,
            model: self,
            filter,
            update,
        };

        match self.schema.hooks().run(&ctx).await? {
            None => Ok(()),
            Some((hook, reason)) => {
                let error = reason.to_string();
                self.db.logger().event(
                    Event::UpdateRejected,
                    &[
                        ("model", self.name()),
                        ("point", point.as_str()),
                        ("hook", hook.as_str()),
                        ("error", error.as_str()),
                    ],
                );
                Err(reason)
            }
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("collection", &self.collection())
            .field("hooks", self.schema.hooks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::document::Value;
    use crate::observability::Logger;
    use crate::schema::{FieldDef, FieldType, HookDecision, HookFuture, PreUpdateHook};
    use crate::store::MemoryStore;

    fn user_schema() -> ModelSchema {
        ModelSchema::new("User")
            .field("name", FieldDef::required(FieldType::String))
            .field("age", FieldDef::optional(FieldType::Int))
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::in_memory("app");
        let users = db.register(user_schema()).unwrap();

        let doc = users
            .create(Document::new().field("name", "Ada").field("age", 36))
            .await
            .unwrap();
        let id = doc.id().cloned().unwrap();

        let found = users.find_by_id(&id).await.unwrap().unwrap();
        assert_eq!(found.get("name"), Some(&Value::from("Ada")));
        assert_eq!(users.count_documents(&Filter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_and_logs() {
        let (logger, sink) = Logger::capture();
        let db = Database::new("app", Arc::new(MemoryStore::new()), logger);
        let users = db.register(user_schema()).unwrap();

        let err = users.create(Document::new().field("age", 3)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation { .. }));
        assert_eq!(users.count_documents(&Filter::all()).await.unwrap(), 0);

        let records = sink.records_for(Event::ValidationFailed);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["path"], "name");
    }

    #[tokio::test]
    async fn test_save_replaces_stored_document() {
        let db = Database::in_memory("app");
        let users = db.register(user_schema()).unwrap();

        let mut doc = users.save(Document::new().field("name", "Ada")).await.unwrap();
        doc.set("age", 37);
        users.save(doc.clone()).await.unwrap();

        let stored = users.find_by_id(doc.id().unwrap()).await.unwrap().unwrap();
        assert_eq!(stored.get("age"), Some(&Value::Int(37)));
        assert_eq!(users.count_documents(&Filter::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_operations() {
        let db = Database::in_memory("app");
        let users = db.register(user_schema()).unwrap();
        for name in ["Ada", "Grace", "Linus"] {
            users.create(Document::new().field("name", name)).await.unwrap();
        }

        let bump = UpdatePayload::new().set("age", 50);
        assert_eq!(users.update_many(&Filter::all(), &bump).await.unwrap(), 3);

        let updated = users
            .find_one_and_update(
                &Filter::all().eq("name", "Grace"),
                &UpdatePayload::new().set("age", 85),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("age"), Some(&Value::Int(85)));

        let missing = users
            .find_one_and_update(&Filter::all().eq("name", "Nobody"), &bump)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    struct Counting(AtomicUsize);

    impl PreUpdateHook for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        fn before_update<'a>(&'a self, _ctx: &'a UpdateContext<'a>) -> HookFuture<'a> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(HookDecision::Allow) })
        }
    }

    struct Deny;

    impl PreUpdateHook for Deny {
        fn name(&self) -> &str {
            "deny"
        }

        fn before_update<'a>(&'a self, _ctx: &'a UpdateContext<'a>) -> HookFuture<'a> {
            Box::pin(async { Ok(HookDecision::Reject(DbError::read_only("name"))) })
        }
    }

    #[tokio::test]
    async fn test_hooks_run_in_order_and_first_rejection_wins() {
        let (logger, sink) = Logger::capture();
        let db = Database::new("app", Arc::new(MemoryStore::new()), logger);

        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let mut schema = user_schema();
        schema
            .hooks_mut()
            .register(HookPoint::UpdateMany, counter.clone());
        schema.hooks_mut().register(HookPoint::UpdateMany, Arc::new(Deny));
        let users = db.register(schema).unwrap();

        users.create(Document::new().field("name", "Ada")).await.unwrap();
        let err = users
            .update_many(&Filter::all(), &UpdatePayload::new().set("name", "Eve"))
            .await
            .unwrap_err();

        assert_eq!(err, DbError::read_only("name"));
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
        let unchanged = users.find_one(&Filter::all()).await.unwrap().unwrap();
        assert_eq!(unchanged.get("name"), Some(&Value::from("Ada")));

        let records = sink.records_for(Event::UpdateRejected);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["hook"], "deny");
        assert_eq!(records[0]["point"], "updateMany");
    }
}
