//! Binary-blob sanitizer
//!
//! Strips raw binary payloads from a document tree before it is handed
//! back to API consumers. Binary fields are replaced by `Undefined`, which
//! the JSON renderer omits.
//!
//! Recursion rules:
//! - nested documents and arrays are descended into only when non-empty
//! - binary items inside arrays become `Undefined` as well
//! - references (`Value::Ref`) have no materialized record and are skipped

use super::types::Document;
use super::value::Value;

/// Strip binary fields from a document in place; returns it for chaining
pub fn sanitize_document(doc: &mut Document) -> &mut Document {
    clear_fields(doc);
    doc
}

/// Strip binary fields from any value in place; returns it for chaining
///
/// Only document and array values have a field tree. A top-level binary
/// or reference value is returned unchanged.
pub fn sanitize(value: &mut Value) -> &mut Value {
    match value {
        Value::Document(doc) => {
            clear_fields(doc);
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                clear_entry(item);
            }
        }
        _ => {}
    }
    value
}

/// Sanitize every document of a result set
pub fn sanitize_all(docs: &mut [Document]) -> usize {
    docs.iter_mut().map(clear_fields).sum()
}

/// Returns the number of binary entries cleared
fn clear_fields(doc: &mut Document) -> usize {
    doc.fields_mut().map(|(_, value)| clear_entry(value)).sum()
}

fn clear_entry(value: &mut Value) -> usize {
    match value {
        Value::Binary(_) => {
            *value = Value::Undefined;
            1
        }
        Value::Document(doc) if !doc.is_empty() => clear_fields(doc),
        Value::Array(items) if !items.is_empty() => items.iter_mut().map(clear_entry).sum(),
        _ => 0,
    }
}
