//! Readonly-field guard
//!
//! Once a guarded field holds a non-null value, updates may not change
//! it. Updates that leave the field out, or assign the value it already
//! holds, go through. A field that is still unset may receive its first
//! value.
//!
//! Single-document updates fetch the current document matching the
//! query; when nothing matches there is nothing to protect and the update
//! is allowed. Many-document updates fetch every match and stop at the
//! first offending document.

use std::sync::Arc;

use crate::document::Document;
use crate::error::{DbError, DbResult};
use crate::store::UpdatePayload;

use super::hooks::{HookDecision, HookFuture, HookPoint, PreUpdateHook, UpdateContext};
use super::types::ModelSchema;

/// Interceptor rejecting changes to readonly fields
#[derive(Debug, Clone)]
pub struct ReadonlyGuard {
    fields: Vec<String>,
}

impl ReadonlyGuard {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// First guarded field the update would change on `current`
    pub fn violation<'a>(&'a self, current: &Document, update: &UpdatePayload) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|field| {
                let Some(new_value) = update.value_for(field) else {
                    return false;
                };
                match current.get(field) {
                    Some(existing) if !existing.is_null() => existing != new_value,
                    _ => false,
                }
            })
            .map(String::as_str)
    }

    fn decide(&self, current: Option<&Document>, update: &UpdatePayload) -> HookDecision {
        match current.and_then(|doc| self.violation(doc, update)) {
            Some(field) => HookDecision::Reject(DbError::read_only(field)),
            None => HookDecision::Allow,
        }
    }

    /// Decision for one document; fetches it when the caller has not
    async fn check(
        &self,
        ctx: &UpdateContext<'_>,
        prefetched: Option<&Document>,
    ) -> DbResult<HookDecision> {
        if let Some(doc) = prefetched {
            return Ok(self.decide(Some(doc), ctx.update));
        }
        let current = ctx.model.find_one(ctx.filter).await?;
        Ok(self.decide(current.as_ref(), ctx.update))
    }
}

impl PreUpdateHook for ReadonlyGuard {
    fn name(&self) -> &str {
        "readonly"
    }

    fn before_update<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> HookFuture<'a> {
        Box::pin(async move {
            // Nothing guarded is touched: no need to look at stored state
            if !self.fields.iter().any(|f| ctx.update.touches(f)) {
                return Ok(HookDecision::Allow);
            }

            if ctx.point.is_single() {
                return self.check(ctx, None).await;
            }

            let docs = ctx.model.find(ctx.filter).await?;
            for doc in &docs {
                let decision = self.check(ctx, Some(doc)).await?;
                if decision != HookDecision::Allow {
                    return Ok(decision);
                }
            }
            Ok(HookDecision::Allow)
        })
    }
}

/// Guard `fields` against changes on all three update hook points
pub fn install_readonly_guard<I, S>(schema: &mut ModelSchema, fields: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let guard: Arc<dyn PreUpdateHook> = Arc::new(ReadonlyGuard::new(fields));
    for point in HookPoint::ALL {
        schema.hooks_mut().register(point, guard.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;

    fn guard() -> ReadonlyGuard {
        ReadonlyGuard::new(["sn", "owner"])
    }

    #[test]
    fn test_untouched_field_allowed() {
        let doc = Document::with_id("d1").field("sn", "A1").field("label", "x");
        let update = UpdatePayload::new().set("label", "y");
        assert_eq!(guard().violation(&doc, &update), None);
    }

    #[test]
    fn test_same_value_allowed() {
        let doc = Document::with_id("d1").field("sn", "A1");
        let update = UpdatePayload::new().set("sn", "A1");
        assert_eq!(guard().violation(&doc, &update), None);
    }

    #[test]
    fn test_changed_value_rejected() {
        let doc = Document::with_id("d1").field("sn", "A1");
        let update = UpdatePayload::new().set("sn", "B2");
        assert_eq!(guard().violation(&doc, &update), Some("sn"));
    }

    #[test]
    fn test_unset_of_held_value_rejected() {
        let doc = Document::with_id("d1").field("owner", "u1");
        let update = UpdatePayload::new().unset("owner");
        assert_eq!(guard().violation(&doc, &update), Some("owner"));
    }

    #[test]
    fn test_first_assignment_allowed() {
        let doc = Document::with_id("d1").field("owner", Value::Null);
        let update = UpdatePayload::new().set("owner", "u1").set("sn", "A1");
        assert_eq!(guard().violation(&doc, &update), None);
    }

    #[test]
    fn test_install_registers_all_points() {
        let mut schema = ModelSchema::new("Device");
        install_readonly_guard(&mut schema, ["sn"]);
        for point in HookPoint::ALL {
            assert_eq!(schema.hooks().hooks_for(point).len(), 1);
            assert_eq!(schema.hooks().hooks_for(point)[0].name(), "readonly");
        }
    }
}
