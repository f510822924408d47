//! docdb-utils - helpers for document database applications
//!
//! - `connection`: resolve a connection string and open a `Database`
//! - `schema`: readonly-field guard and reusable field validators
//! - `document`: document trees and the binary-field sanitizer
//! - `store`: storage backend and driver seams, MongoDB and in-memory

pub mod cli;
pub mod connection;
pub mod document;
pub mod error;
pub mod model;
pub mod observability;
pub mod schema;
pub mod store;

pub use connection::{connect, connect_with_config, ConnectionConfig, Connector};
pub use document::{sanitize, sanitize_document, Document, DocumentId, Value};
pub use error::{DbError, DbResult};
pub use model::{Database, Model};
pub use schema::{install_readonly_guard, FieldDef, FieldType, ModelSchema, Validate};
pub use store::{Driver, Filter, MemoryDriver, MongoDriver, UpdatePayload};
