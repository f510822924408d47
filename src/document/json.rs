//! JSON conversion for documents
//!
//! - `_id` carries the identity
//! - `Undefined` fields are omitted; `Undefined` array items become `null`
//! - binary blobs render as `{"$binary": "<base64>"}`
//! - references render as `{"$ref": "<id>"}`

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Number, Value as Json};

use crate::error::{DbError, DbResult};

use super::types::{Document, DocumentId, ID_FIELD};
use super::value::Value;

const BINARY_KEY: &str = "$binary";
const REF_KEY: &str = "$ref";

impl Document {
    /// Render the document tree as JSON
    pub fn to_json(&self) -> Json {
        let mut obj = Map::new();
        if let Some(id) = self.id() {
            obj.insert(ID_FIELD.to_string(), Json::String(id.to_string()));
        }
        for (name, value) in self.fields() {
            if matches!(value, Value::Undefined) {
                continue;
            }
            obj.insert(name.clone(), value.to_json());
        }
        Json::Object(obj)
    }

    /// Parse a JSON object into a new document
    pub fn from_json(json: &Json) -> DbResult<Self> {
        let obj = json.as_object().ok_or_else(|| {
            DbError::Serialization(format!("expected object, got {}", json_type_name(json)))
        })?;
        document_from_map(obj)
    }
}

impl Value {
    /// Render a value as JSON
    pub fn to_json(&self) -> Json {
        match self {
            Value::Null | Value::Undefined => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(n) => Json::Number((*n).into()),
            Value::Float(x) => Number::from_f64(*x).map(Json::Number).unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Binary(bytes) => {
                let mut obj = Map::new();
                obj.insert(BINARY_KEY.to_string(), Json::String(STANDARD.encode(bytes)));
                Json::Object(obj)
            }
            Value::Array(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Document(doc) => doc.to_json(),
            Value::Ref(id) => {
                let mut obj = Map::new();
                obj.insert(REF_KEY.to_string(), Json::String(id.to_string()));
                Json::Object(obj)
            }
        }
    }

    /// Parse a JSON value
    pub fn from_json(json: &Json) -> DbResult<Self> {
        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::String(s.clone()),
            Json::Array(items) => Value::Array(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<DbResult<Vec<_>>>()?,
            ),
            Json::Object(obj) => {
                if let Some(encoded) = single_key(obj, BINARY_KEY) {
                    let bytes = STANDARD.decode(encoded).map_err(|e| {
                        DbError::Serialization(format!("invalid {} payload: {}", BINARY_KEY, e))
                    })?;
                    Value::Binary(bytes)
                } else if let Some(id) = single_key(obj, REF_KEY) {
                    Value::Ref(DocumentId::new(id))
                } else {
                    Value::Document(document_from_map(obj)?)
                }
            }
        })
    }
}

fn document_from_map(obj: &Map<String, Json>) -> DbResult<Document> {
    let mut doc = Document::new();
    for (name, value) in obj {
        if name == ID_FIELD {
            let id = match value {
                Json::String(s) => DocumentId::new(s.clone()),
                Json::Number(n) => DocumentId::new(n.to_string()),
                other => {
                    return Err(DbError::Serialization(format!(
                        "{} must be a string or number, got {}",
                        ID_FIELD,
                        json_type_name(other)
                    )))
                }
            };
            doc.set_id(id);
            continue;
        }
        doc.set(name.clone(), Value::from_json(value)?);
    }
    Ok(doc)
}

/// The string under `key` when it is the object's only entry
fn single_key<'a>(obj: &'a Map<String, Json>, key: &str) -> Option<&'a str> {
    if obj.len() != 1 {
        return None;
    }
    obj.get(key).and_then(Json::as_str)
}

fn json_type_name(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_takes_identity() {
        let doc = Document::from_json(&json!({"_id": "u1", "name": "Ada", "age": 36})).unwrap();
        assert_eq!(doc.id().map(DocumentId::as_str), Some("u1"));
        assert_eq!(doc.get("age"), Some(&Value::Int(36)));
        assert!(!doc.contains("_id"));
    }

    #[test]
    fn test_binary_and_ref_markers() {
        let doc = Document::from_json(&json!({
            "avatar": {"$binary": "AQID"},
            "owner": {"$ref": "u9"}
        }))
        .unwrap();
        assert_eq!(doc.get("avatar"), Some(&Value::Binary(vec![1, 2, 3])));
        assert_eq!(doc.get("owner"), Some(&Value::Ref(DocumentId::new("u9"))));
        assert_eq!(doc.to_json()["avatar"], json!({"$binary": "AQID"}));
    }

    #[test]
    fn test_undefined_fields_are_omitted() {
        let doc = Document::new()
            .field("kept", 1)
            .field("gone", Value::Undefined)
            .field("list", vec![Value::Undefined, Value::from(2)]);
        let out = doc.to_json();
        assert_eq!(out, json!({"kept": 1, "list": [null, 2]}));
    }

    #[test]
    fn test_non_object_rejected() {
        let err = Document::from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[test]
    fn test_bad_id_type_rejected() {
        assert!(Document::from_json(&json!({"_id": true})).is_err());
    }
}
