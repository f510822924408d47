//! Schema type definitions
//!
//! Supported field types:
//! - any: no type check
//! - string, int, bool, float, binary
//! - object: nested object with its own field schema
//! - array: homogeneous array with element type
//! - ref: reference to another document

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::hooks::HookRegistry;
use super::validator::FieldValidator;

/// Supported field types
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    /// Mixed content, never type-checked
    Any,
    String,
    Int,
    Bool,
    /// 64-bit float; integers are accepted
    Float,
    Binary,
    /// Nested object with its own field schema
    Object { fields: BTreeMap<String, FieldType> },
    /// Homogeneous array with single element type
    Array { element_type: Box<FieldType> },
    Ref,
}

impl FieldType {
    /// Array of `element`
    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array {
            element_type: Box::new(element),
        }
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Any => "any",
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Binary => "binary",
            FieldType::Object { .. } => "object",
            FieldType::Array { .. } => "array",
            FieldType::Ref => "ref",
        }
    }
}

/// Field definition: type, presence rule and validators
#[derive(Clone)]
pub struct FieldDef {
    pub field_type: FieldType,
    pub required: bool,
    validators: Vec<Arc<dyn FieldValidator>>,
}

impl FieldDef {
    /// Required field of the given type
    pub fn required(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            validators: Vec::new(),
        }
    }

    /// Optional field of the given type
    pub fn optional(field_type: FieldType) -> Self {
        Self {
            required: false,
            ..Self::required(field_type)
        }
    }

    /// Attach a validator; validators run in attachment order
    pub fn validate_with(mut self, validator: impl FieldValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn validators(&self) -> &[Arc<dyn FieldValidator>] {
        &self.validators
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Declarative description of a model's documents.
///
/// Built once at startup. Hooks are registered on the schema before it
/// is handed to a database; after registration it is shared read-only.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    collection: String,
    fields: BTreeMap<String, FieldDef>,
    hooks: HookRegistry,
}

impl ModelSchema {
    /// Schema for `name`, stored in a collection named after it,
    /// lowercased with an `s` appended (`User` -> `users`)
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let collection = format!("{}s", name.to_lowercase());
        Self {
            name,
            collection,
            fields: BTreeMap::new(),
            hooks: HookRegistry::new(),
        }
    }

    /// Override the collection name
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Declare a field
    pub fn field(mut self, name: impl Into<String>, def: FieldDef) -> Self {
        self.fields.insert(name.into(), def);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldDef> {
        &self.fields
    }

    pub fn field_def(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut HookRegistry {
        &mut self.hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_collection_name() {
        assert_eq!(ModelSchema::new("User").collection(), "users");
        assert_eq!(
            ModelSchema::new("Person").with_collection("people").collection(),
            "people"
        );
    }

    #[test]
    fn test_field_def_presence() {
        assert!(FieldDef::required(FieldType::String).required);
        assert!(!FieldDef::optional(FieldType::Int).required);
    }

    #[test]
    fn test_field_type_names() {
        assert_eq!(FieldType::String.type_name(), "string");
        assert_eq!(FieldType::array_of(FieldType::Int).type_name(), "array");
        assert_eq!(
            FieldType::Object {
                fields: BTreeMap::new()
            }
            .type_name(),
            "object"
        );
        assert_eq!(FieldType::Binary.type_name(), "binary");
    }
}
