//! Equality filters used to select documents

use crate::document::{Document, DocumentId, Value, ID_FIELD};

/// Conjunction of `field == value` conditions.
///
/// An empty filter matches every document. Field names may be dotted
/// paths into nested documents; `_id` matches the document identity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// Filter matching every document
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter matching one identity
    pub fn by_id(id: &DocumentId) -> Self {
        Self::all().eq(ID_FIELD, id.as_str())
    }

    /// Add an equality condition
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((field.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Check whether a document satisfies every condition
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|(field, expected)| {
            if field == ID_FIELD {
                return match (doc.id(), expected) {
                    (Some(id), Value::String(s)) => id.as_str() == s.as_str(),
                    _ => false,
                };
            }
            match doc.get_path(field) {
                Some(actual) => actual == expected,
                // Missing fields match an explicit null
                None => expected.is_null(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Document {
        Document::with_id("u1")
            .field("email", "ada@example.com")
            .field("address", Document::new().field("city", "Paris"))
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(Filter::all().matches(&user()));
    }

    #[test]
    fn test_eq_and_nested_path() {
        let f = Filter::all()
            .eq("email", "ada@example.com")
            .eq("address.city", "Paris");
        assert!(f.matches(&user()));
        assert!(!Filter::all().eq("address.city", "Rome").matches(&user()));
    }

    #[test]
    fn test_by_id() {
        assert!(Filter::by_id(&DocumentId::new("u1")).matches(&user()));
        assert!(!Filter::by_id(&DocumentId::new("u2")).matches(&user()));
    }

    #[test]
    fn test_missing_field_matches_null() {
        assert!(Filter::all().eq("phone", Value::Null).matches(&user()));
        assert!(!Filter::all().eq("phone", "555").matches(&user()));
    }
}
