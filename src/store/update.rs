//! Update payloads
//!
//! A payload maps field names to new values. It is built either
//! programmatically or from a JSON object of the form
//! `{"name": v, "$set": {...}, "$unset": {"field": ""}}`.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value as Json;

use crate::document::{Document, Value, ID_FIELD};
use crate::error::{DbError, DbResult};

static UNSET: Value = Value::Null;

/// Field assignments applied by an update operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    set: BTreeMap<String, Value>,
    unset: BTreeSet<String>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a new value to a field
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        self.unset.remove(&field);
        self.set.insert(field, value.into());
        self
    }

    /// Remove a field
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.set.remove(&field);
        self.unset.insert(field);
        self
    }

    /// Parse a JSON update object
    pub fn from_json(json: &Json) -> DbResult<Self> {
        let obj = json
            .as_object()
            .ok_or_else(|| DbError::Serialization("update payload must be an object".into()))?;

        let mut payload = Self::new();
        for (key, value) in obj {
            match key.as_str() {
                "$set" => {
                    let fields = value.as_object().ok_or_else(|| {
                        DbError::Serialization("$set must be an object".into())
                    })?;
                    for (field, v) in fields {
                        payload = payload.set(field.clone(), Value::from_json(v)?);
                    }
                }
                "$unset" => {
                    let fields = value.as_object().ok_or_else(|| {
                        DbError::Serialization("$unset must be an object".into())
                    })?;
                    for field in fields.keys() {
                        payload = payload.unset(field.clone());
                    }
                }
                op if op.starts_with('$') => {
                    return Err(DbError::Serialization(format!(
                        "unsupported update operator {}",
                        op
                    )));
                }
                field => {
                    payload = payload.set(field, Value::from_json(value)?);
                }
            }
        }
        Ok(payload)
    }

    /// The value this payload assigns to `field`, if it touches it.
    ///
    /// An unset field reads as `Null`.
    pub fn value_for(&self, field: &str) -> Option<&Value> {
        if let Some(v) = self.set.get(field) {
            return Some(v);
        }
        if self.unset.contains(field) {
            return Some(&UNSET);
        }
        None
    }

    /// Whether the payload assigns or removes `field`
    pub fn touches(&self, field: &str) -> bool {
        self.set.contains_key(field) || self.unset.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Fields assigned a new value, sorted by name
    pub fn assignments(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.set.iter()
    }

    /// Fields removed, sorted by name
    pub fn removals(&self) -> impl Iterator<Item = &String> {
        self.unset.iter()
    }

    /// Apply the assignments to a document; `_id` is never rewritten
    pub fn apply_to(&self, doc: &mut Document) -> DbResult<()> {
        if self.touches(ID_FIELD) {
            return Err(DbError::validation(ID_FIELD, "identity cannot be updated"));
        }
        for (field, value) in &self.set {
            doc.set(field.clone(), value.clone());
        }
        for field in &self.unset {
            doc.remove(field);
        }
        Ok(())
    }
}
