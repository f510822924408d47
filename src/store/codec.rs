//! BSON conversion for the MongoDB backend
//!
//! - identities are stored as strings in `_id`; ObjectId identities read
//!   back as their hex form
//! - `Undefined` fields are not written
//! - references are written as ObjectIds when the id is one, else as strings
//! - ObjectIds in ordinary fields read back as references

use mongodb::bson::oid::ObjectId;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{Binary, Bson, Document as BsonDocument};

use crate::document::{Document, DocumentId, Value, ID_FIELD};

use super::filter::Filter;
use super::update::UpdatePayload;

/// Document to a BSON document, identity included
pub fn to_bson_document(doc: &Document) -> BsonDocument {
    let mut out = BsonDocument::new();
    if let Some(id) = doc.id() {
        out.insert(ID_FIELD, id.as_str());
    }
    write_fields(doc, &mut out);
    out
}

/// Stored BSON document back to a document marked as stored
pub fn from_bson_document(raw: BsonDocument) -> Document {
    let mut doc = read_fields(raw);
    doc.mark_stored();
    doc
}

pub fn to_bson(value: &Value) -> Bson {
    match value {
        Value::Null => Bson::Null,
        Value::Undefined => Bson::Undefined,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Int(n) => Bson::Int64(*n),
        Value::Float(x) => Bson::Double(*x),
        Value::String(s) => Bson::String(s.clone()),
        Value::Binary(bytes) => Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: bytes.clone(),
        }),
        Value::Array(items) => Bson::Array(items.iter().map(to_bson).collect()),
        Value::Document(doc) => {
            let mut nested = BsonDocument::new();
            write_fields(doc, &mut nested);
            Bson::Document(nested)
        }
        Value::Ref(id) => match ObjectId::parse_str(id.as_str()) {
            Ok(oid) => Bson::ObjectId(oid),
            Err(_) => Bson::String(id.to_string()),
        },
    }
}

pub fn from_bson(value: Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Undefined => Value::Undefined,
        Bson::Boolean(b) => Value::Bool(b),
        Bson::Int32(n) => Value::Int(n.into()),
        Bson::Int64(n) => Value::Int(n),
        Bson::Double(x) => Value::Float(x),
        Bson::String(s) => Value::String(s),
        Bson::Binary(bin) => Value::Binary(bin.bytes),
        Bson::Array(items) => Value::Array(items.into_iter().map(from_bson).collect()),
        Bson::Document(doc) => Value::Document(read_fields(doc)),
        Bson::ObjectId(oid) => Value::Ref(DocumentId::new(oid.to_hex())),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.timestamp_millis().to_string()),
        ),
        other => Value::String(other.to_string()),
    }
}

/// Equality conditions as a query document
pub fn filter_document(filter: &Filter) -> BsonDocument {
    let mut out = BsonDocument::new();
    for (field, value) in filter.conditions() {
        out.insert(field.clone(), to_bson(value));
    }
    out
}

/// `$set` / `$unset` update document; `None` when the payload is empty
pub fn update_document(update: &UpdatePayload) -> Option<BsonDocument> {
    let mut set = BsonDocument::new();
    for (field, value) in update.assignments() {
        set.insert(field.clone(), to_bson(value));
    }
    let mut unset = BsonDocument::new();
    for field in update.removals() {
        unset.insert(field.clone(), "");
    }

    let mut out = BsonDocument::new();
    if !set.is_empty() {
        out.insert("$set", set);
    }
    if !unset.is_empty() {
        out.insert("$unset", unset);
    }
    (!out.is_empty()).then_some(out)
}

fn write_fields(doc: &Document, out: &mut BsonDocument) {
    for (name, value) in doc.fields() {
        if !matches!(value, Value::Undefined) {
            out.insert(name.clone(), to_bson(value));
        }
    }
}

fn read_fields(raw: BsonDocument) -> Document {
    let mut doc = Document::new();
    for (name, value) in raw {
        if name == ID_FIELD {
            let id = match value {
                Bson::String(s) => s,
                Bson::ObjectId(oid) => oid.to_hex(),
                other => other.to_string(),
            };
            doc.set_id(DocumentId::new(id));
            continue;
        }
        doc.set(name, from_bson(value));
    }
    doc
}
