//! Field validation
//!
//! Validation semantics on create/save:
//! - required fields are present and not null
//! - no undeclared fields exist
//! - field types match (integers are accepted as floats)
//! - then each field's validators run in order; the first failure aborts
//!
//! Validators are skipped for absent and null values.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use crate::document::{Document, Value};
use crate::error::{DbError, DbResult};
use crate::model::Database;

use super::types::{FieldType, ModelSchema};

/// Future returned by [`FieldValidator::validate`]
pub type ValidationFuture<'a> = Pin<Box<dyn Future<Output = DbResult<bool>> + Send + 'a>>;

/// What a validator sees besides the value itself
pub struct ValidationContext<'a> {
    pub database: &'a Database,
    pub document: &'a Document,
    pub path: &'a str,
}

/// Values substituted into failure messages
#[derive(Debug, Clone, Copy)]
pub struct ValidatorProps<'a> {
    pub path: &'a str,
    pub value: &'a Value,
}

/// Message with `{PATH}` and `{VALUE}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(String);

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn render(&self, props: &ValidatorProps<'_>) -> String {
        self.0
            .replace("{PATH}", props.path)
            .replace("{VALUE}", &props.value.to_string())
    }
}

/// A predicate attached to a schema field
pub trait FieldValidator: Send + Sync {
    /// `Ok(true)` when the value passes; `Err` when the check itself failed
    fn validate<'a>(&'a self, value: &'a Value, ctx: &'a ValidationContext<'a>)
        -> ValidationFuture<'a>;

    /// Failure message for the last rejected value
    fn message(&self, props: &ValidatorProps<'_>) -> String;
}

/// Check a document against the declared field types
pub fn check_structure(schema: &ModelSchema, doc: &Document) -> DbResult<()> {
    for (name, _) in doc.fields() {
        if schema.field_def(name).is_none() {
            return Err(DbError::validation(name.clone(), "undeclared field"));
        }
    }

    for (name, def) in schema.fields() {
        match doc.get(name) {
            Some(value) if !value.is_null() => check_type(value, &def.field_type, name)?,
            _ if def.required => {
                return Err(DbError::validation(name.clone(), format!("{} is required", name)));
            }
            _ => {}
        }
    }

    Ok(())
}

/// Run every field validator against a document
pub async fn run_validators(schema: &ModelSchema, database: &Database, doc: &Document) -> DbResult<()> {
    for (name, def) in schema.fields() {
        let value = match doc.get(name) {
            Some(v) if !v.is_null() => v,
            _ => continue,
        };

        let ctx = ValidationContext {
            database,
            document: doc,
            path: name,
        };
        for validator in def.validators() {
            if !validator.validate(value, &ctx).await? {
                let props = ValidatorProps { path: name, value };
                return Err(DbError::validation(name.clone(), validator.message(&props)));
            }
        }
    }

    Ok(())
}

fn check_type(value: &Value, expected: &FieldType, path: &str) -> DbResult<()> {
    let ok = match (expected, value) {
        (FieldType::Any, _) => true,
        (FieldType::String, Value::String(_)) => true,
        (FieldType::Int, Value::Int(_)) => true,
        (FieldType::Bool, Value::Bool(_)) => true,
        (FieldType::Float, Value::Float(_) | Value::Int(_)) => true,
        (FieldType::Binary, Value::Binary(_)) => true,
        (FieldType::Ref, Value::Ref(_)) => true,
        (FieldType::Object { fields }, Value::Document(doc)) => {
            return check_nested(doc, fields, path);
        }
        (FieldType::Array { element_type }, Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if !item.is_null() {
                    check_type(item, element_type, &format!("{}[{}]", path, i))?;
                }
            }
            true
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(DbError::validation(
            path,
            format!("expected {}, got {}", expected.type_name(), value.type_name()),
        ))
    }
}

fn check_nested(doc: &Document, fields: &BTreeMap<String, FieldType>, path: &str) -> DbResult<()> {
    for (name, value) in doc.fields() {
        let field_path = format!("{}.{}", path, name);
        let expected = fields
            .get(name)
            .ok_or_else(|| DbError::validation(field_path.clone(), "undeclared field"))?;
        if !value.is_null() {
            check_type(value, expected, &field_path)?;
        }
    }
    Ok(())
}
