//! Document and identity types

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::Value;

/// Field name of the document identity
pub const ID_FIELD: &str = "_id";

/// Document identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A record with an optional identity and a nested field tree.
///
/// Top-level documents receive an identity when first inserted; nested
/// sub-documents may stay anonymous. `is_new` is true until the document
/// has been read back from a store.
#[derive(Debug, Clone)]
pub struct Document {
    id: Option<DocumentId>,
    fields: BTreeMap<String, Value>,
    is_new: bool,
}

impl Document {
    /// Empty, not-yet-stored document
    pub fn new() -> Self {
        Self {
            id: None,
            fields: BTreeMap::new(),
            is_new: true,
        }
    }

    /// Empty document with a caller-chosen identity
    pub fn with_id(id: impl Into<DocumentId>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::new()
        }
    }

    /// Builder-style field assignment
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    pub fn set_id(&mut self, id: DocumentId) {
        self.id = Some(id);
    }

    /// Identity, generating one if the document has none yet
    pub fn ensure_id(&mut self) -> &DocumentId {
        self.id.get_or_insert_with(DocumentId::generate)
    }

    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Mark the document as loaded from a store
    pub fn mark_stored(&mut self) {
        self.is_new = false;
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Lookup through nested documents with a dotted path (`address.city`)
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.fields.get(first)?;
        for part in parts {
            current = current.as_document()?.fields.get(part)?;
        }
        Some(current)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&String, &mut Value)> {
        self.fields.iter_mut()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity and fields are compared; the `is_new` flag is not.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.fields == other.fields
    }
}
