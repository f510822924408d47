//! Reusable field validators
//!
//! ```ignore
//! let schema = ModelSchema::new("User")
//!     .field("email", FieldDef::required(FieldType::String)
//!         .validate_with(Validate::unique("email", "User")))
//!     .field("tags", FieldDef::optional(FieldType::array_of(FieldType::String))
//!         .validate_with(Validate::unique_array_item())
//!         .validate_with(Validate::max_count(5)));
//! ```

use crate::document::Value;
use crate::store::Filter;

use super::validator::{
    FieldValidator, MessageTemplate, ValidationContext, ValidationFuture, ValidatorProps,
};

/// Validator factory
pub struct Validate;

impl Validate {
    /// Value must not already be used by another document of `model`
    pub fn unique(field: impl Into<String>, model: impl Into<String>) -> Unique {
        Unique {
            field: field.into(),
            model: model.into(),
            message: MessageTemplate::new("{VALUE} already exists."),
        }
    }

    /// Array items must be distinct. The message names the duplicates
    /// of the value being rejected.
    pub fn unique_array_item() -> UniqueArrayItem {
        UniqueArrayItem
    }

    /// Array must hold at most `limit` items
    pub fn max_count(limit: usize) -> MaxCount {
        MaxCount {
            limit,
            message: MessageTemplate::new(format!("{{PATH}} count exceeds the limit of {}", limit)),
        }
    }
}

/// See [`Validate::unique`]
pub struct Unique {
    field: String,
    model: String,
    message: MessageTemplate,
}

impl FieldValidator for Unique {
    fn validate<'a>(
        &'a self,
        value: &'a Value,
        ctx: &'a ValidationContext<'a>,
    ) -> ValidationFuture<'a> {
        Box::pin(async move {
            if !ctx.document.is_new() {
                return Ok(true);
            }
            let model = ctx.database.model(&self.model)?;
            let filter = Filter::all().eq(self.field.clone(), value.clone());
            // Count faults propagate; they are never read as a pass or a fail
            let count = model.count_documents(&filter).await?;
            Ok(count <= 1)
        })
    }

    fn message(&self, props: &ValidatorProps<'_>) -> String {
        self.message.render(props)
    }
}

/// See [`Validate::unique_array_item`]
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueArrayItem;

impl UniqueArrayItem {
    /// Synchronous form of the predicate; non-arrays fail
    pub fn check(&self, value: &Value) -> bool {
        value
            .as_array()
            .is_some_and(|items| find_duplicates(items).is_empty())
    }
}

impl FieldValidator for UniqueArrayItem {
    fn validate<'a>(
        &'a self,
        value: &'a Value,
        _ctx: &'a ValidationContext<'a>,
    ) -> ValidationFuture<'a> {
        let passed = self.check(value);
        Box::pin(async move { Ok(passed) })
    }

    fn message(&self, props: &ValidatorProps<'_>) -> String {
        match props.value.as_array() {
            Some(items) => format!("{} already exist(s).", Value::Array(find_duplicates(items))),
            None => format!("{} must be an array", props.path),
        }
    }
}

/// See [`Validate::max_count`]
pub struct MaxCount {
    limit: usize,
    message: MessageTemplate,
}

impl MaxCount {
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Message template, `{PATH}` still unexpanded
    pub fn template(&self) -> &MessageTemplate {
        &self.message
    }

    /// Synchronous form of the predicate
    pub fn check(&self, value: &Value) -> bool {
        value.as_array().is_some_and(|items| items.len() <= self.limit)
    }
}

impl FieldValidator for MaxCount {
    fn validate<'a>(
        &'a self,
        value: &'a Value,
        _ctx: &'a ValidationContext<'a>,
    ) -> ValidationFuture<'a> {
        let passed = self.check(value);
        Box::pin(async move { Ok(passed) })
    }

    fn message(&self, props: &ValidatorProps<'_>) -> String {
        self.message.render(props)
    }
}

/// Every value that occurs more than once, in order of first repeat
pub fn find_duplicates(items: &[Value]) -> Vec<Value> {
    let mut duplicates: Vec<Value> = Vec::new();
    for (i, item) in items.iter().enumerate() {
        if items[..i].contains(item) && !duplicates.contains(item) {
            duplicates.push(item.clone());
        }
    }
    duplicates
}
