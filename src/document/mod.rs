//! Document model
//!
//! In-memory document trees passed between the store, the schema hooks
//! and the sanitizer. Documents are owned by the storage layer; helpers
//! only inspect or mutate copies handed to them.

mod json;
mod sanitize;
mod types;
mod value;

pub use sanitize::{sanitize, sanitize_all, sanitize_document};
pub use types::{Document, DocumentId, ID_FIELD};
pub use value::Value;
