//! Validator Tests
//!
//! Field validators running through `Model::create` and `Model::save`:
//! - unique: counts existing documents, passes up to one match
//! - unique_array_item: names the duplicated items
//! - max_count: bounds array length
//! - validator faults propagate as errors

use std::sync::Arc;

use docdb_utils::observability::{Event, Logger};
use docdb_utils::store::{MemoryStore, StorageBackend, StoreFuture};
use docdb_utils::{
    Database, DbError, Document, DocumentId, FieldDef, FieldType, Filter, ModelSchema,
    UpdatePayload, Validate, Value,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn user_schema() -> ModelSchema {
    ModelSchema::new("User")
        .field(
            "email",
            FieldDef::required(FieldType::String).validate_with(Validate::unique("email", "User")),
        )
        .field(
            "tags",
            FieldDef::optional(FieldType::array_of(FieldType::String))
                .validate_with(Validate::unique_array_item())
                .validate_with(Validate::max_count(3)),
        )
}

fn user(email: &str) -> Document {
    Document::new().field("email", email)
}

fn validation_message(err: DbError) -> (String, String) {
    match err {
        DbError::Validation { path, message } => (path, message),
        other => panic!("expected validation error, got {:?}", other),
    }
}

// =============================================================================
// unique
// =============================================================================

#[tokio::test]
async fn test_unique_passes_with_zero_or_one_existing_match() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    users.create(user("ada@example.com")).await.unwrap();
    // One existing match still passes
    users.create(user("ada@example.com")).await.unwrap();

    let count = users
        .count_documents(&Filter::all().eq("email", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn test_unique_fails_with_two_existing_matches() {
    let (logger, sink) = Logger::capture();
    let db = Database::new("crm", Arc::new(MemoryStore::new()), logger);
    let users = db.register(user_schema()).unwrap();

    users.create(user("ada@example.com")).await.unwrap();
    users.create(user("ada@example.com")).await.unwrap();
    let err = users.create(user("ada@example.com")).await.unwrap_err();

    let (path, message) = validation_message(err);
    assert_eq!(path, "email");
    assert_eq!(message, "ada@example.com already exists.");

    let records = sink.records_for(Event::ValidationFailed);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["path"], "email");
}

#[tokio::test]
async fn test_unique_skipped_for_stored_documents() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    for _ in 0..2 {
        users.create(user("grace@example.com")).await.unwrap();
    }
    let mut stored = users
        .find_one(&Filter::all().eq("email", "grace@example.com"))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_new());

    stored.set("tags", vec!["admin"]);
    let saved = users.save(stored).await.unwrap();
    assert_eq!(saved.get("tags"), Some(&Value::from(vec!["admin"])));
}

#[tokio::test]
async fn test_unique_against_unregistered_model_fails() {
    let db = Database::in_memory("crm");
    let schema = ModelSchema::new("Account").field(
        "email",
        FieldDef::required(FieldType::String).validate_with(Validate::unique("email", "User")),
    );
    let accounts = db.register(schema).unwrap();

    let err = accounts.create(user("x@example.com")).await.unwrap_err();
    assert_eq!(err, DbError::UnknownModel("User".into()));
}

/// Backend whose counts always fail
struct BrokenCounts(MemoryStore);

impl StorageBackend for BrokenCounts {
    fn insert<'a>(&'a self, collection: &'a str, document: Document) -> StoreFuture<'a, Document> {
        self.0.insert(collection, document)
    }

    fn replace<'a>(&'a self, collection: &'a str, document: Document) -> StoreFuture<'a, Document> {
        self.0.replace(collection, document)
    }

    fn find<'a>(
        &'a self,
        collection: &'a str,
        filter: &'a Filter,
        limit: Option<usize>,
    ) -> StoreFuture<'a, Vec<Document>> {
        self.0.find(collection, filter, limit)
    }

    fn count<'a>(&'a self, _collection: &'a str, _filter: &'a Filter) -> StoreFuture<'a, u64> {
        Box::pin(async { Err(DbError::storage("count timed out")) })
    }

    fn update<'a>(
        &'a self,
        collection: &'a str,
        id: &'a DocumentId,
        update: &'a UpdatePayload,
    ) -> StoreFuture<'a, Option<Document>> {
        self.0.update(collection, id, update)
    }

    fn ping(&self) -> StoreFuture<'_, ()> {
        self.0.ping()
    }
}

#[tokio::test]
async fn test_count_fault_propagates() {
    let db = Database::new(
        "crm",
        Arc::new(BrokenCounts(MemoryStore::new())),
        Logger::capture().0,
    );
    let users = db.register(user_schema()).unwrap();

    let err = users.create(user("ada@example.com")).await.unwrap_err();
    assert_eq!(err, DbError::storage("count timed out"));
}

// =============================================================================
// unique_array_item / max_count
// =============================================================================

#[tokio::test]
async fn test_duplicate_tags_rejected() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    let doc = user("ada@example.com").field("tags", vec!["a", "b", "b"]);
    let (path, message) = validation_message(users.create(doc).await.unwrap_err());
    assert_eq!(path, "tags");
    assert_eq!(message, "b already exist(s).");

    let ok = user("ada@example.com").field("tags", vec!["a", "b", "c"]);
    assert!(users.create(ok).await.is_ok());
}

#[tokio::test]
async fn test_too_many_tags_rejected() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    let doc = user("ada@example.com").field("tags", vec!["a", "b", "c", "d"]);
    let (path, message) = validation_message(users.create(doc).await.unwrap_err());
    assert_eq!(path, "tags");
    assert_eq!(message, "tags count exceeds the limit of 3");
}

#[tokio::test]
async fn test_empty_and_single_tag_lists_pass() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    let empty: Vec<&str> = Vec::new();
    users
        .create(user("a@example.com").field("tags", empty))
        .await
        .unwrap();
    users
        .create(user("b@example.com").field("tags", vec!["solo"]))
        .await
        .unwrap();
    users
        .create(user("c@example.com").field("tags", Value::Null))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_validators_on_untyped_field_reject_non_arrays() {
    let db = Database::in_memory("crm");
    let schema = ModelSchema::new("Note").field(
        "refs",
        FieldDef::optional(FieldType::Any).validate_with(Validate::max_count(2)),
    );
    let notes = db.register(schema).unwrap();

    let err = notes
        .create(Document::new().field("refs", "not-a-list"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Validation { .. }));
}

#[tokio::test]
async fn test_unique_array_item_on_non_array_names_the_path() {
    let db = Database::in_memory("crm");
    let schema = ModelSchema::new("Note").field(
        "refs",
        FieldDef::optional(FieldType::Any).validate_with(Validate::unique_array_item()),
    );
    let notes = db.register(schema).unwrap();

    let err = notes
        .create(Document::new().field("refs", "not-a-list"))
        .await
        .unwrap_err();
    let (path, message) = validation_message(err);
    assert_eq!(path, "refs");
    assert_eq!(message, "refs must be an array");
}

#[tokio::test]
async fn test_concurrent_rejections_report_their_own_duplicates() {
    let db = Database::in_memory("crm");
    let users = db.register(user_schema()).unwrap();

    let first = user("a@example.com").field("tags", vec!["x", "x"]);
    let second = user("b@example.com").field("tags", vec!["y", "z", "z"]);
    let (a, b) = tokio::join!(users.create(first), users.create(second));

    assert_eq!(validation_message(a.unwrap_err()).1, "x already exist(s).");
    assert_eq!(validation_message(b.unwrap_err()).1, "z already exist(s).");
}
