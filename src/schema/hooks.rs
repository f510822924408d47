//! Pre-update interceptors
//!
//! Each schema carries an ordered list of interceptors per hook point.
//! The model runs them before applying an update; the first rejection
//! aborts the update and nothing is written.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::{DbError, DbResult};
use crate::model::Model;
use crate::store::{Filter, UpdatePayload};

/// Update shapes that can be intercepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Update one document addressed by identity
    FindByIdAndUpdate,
    /// Update the first document matching a query
    FindOneAndUpdate,
    /// Update every document matching a query
    UpdateMany,
}

impl HookPoint {
    /// Every hook point, in registration order
    pub const ALL: [HookPoint; 3] = [
        HookPoint::FindByIdAndUpdate,
        HookPoint::FindOneAndUpdate,
        HookPoint::UpdateMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HookPoint::FindByIdAndUpdate => "findByIdAndUpdate",
            HookPoint::FindOneAndUpdate => "findOneAndUpdate",
            HookPoint::UpdateMany => "updateMany",
        }
    }

    /// Whether the update targets a single document
    pub fn is_single(&self) -> bool {
        !matches!(self, HookPoint::UpdateMany)
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one interceptor
#[derive(Debug, Clone, PartialEq)]
pub enum HookDecision {
    Allow,
    Reject(DbError),
}

/// The update being intercepted
pub struct UpdateContext<'a> {
    pub point: HookPoint,
    pub model: &'a Model,
    pub filter: &'a Filter,
    pub update: &'a UpdatePayload,
}

/// Future returned by [`PreUpdateHook::before_update`]
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = DbResult<HookDecision>> + Send + 'a>>;

/// Interceptor invoked before an update is applied
pub trait PreUpdateHook: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Decide whether the update may proceed.
    ///
    /// An `Err` is a failure of the hook itself (for example a failed
    /// fetch) and aborts the update just like a rejection.
    fn before_update<'a>(&'a self, ctx: &'a UpdateContext<'a>) -> HookFuture<'a>;
}

/// Ordered interceptors per hook point
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: HashMap<HookPoint, Vec<Arc<dyn PreUpdateHook>>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interceptor to a hook point
    pub fn register(&mut self, point: HookPoint, hook: Arc<dyn PreUpdateHook>) {
        self.hooks.entry(point).or_default().push(hook);
    }

    /// Interceptors for a hook point, in registration order
    pub fn hooks_for(&self, point: HookPoint) -> &[Arc<dyn PreUpdateHook>] {
        self.hooks.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.values().all(Vec::is_empty)
    }

    /// Run every interceptor for `ctx.point` until one rejects.
    ///
    /// Returns the rejecting hook's name alongside its reason.
    pub async fn run(&self, ctx: &UpdateContext<'_>) -> DbResult<Option<(String, DbError)>> {
        for hook in self.hooks_for(ctx.point) {
            if let HookDecision::Reject(reason) = hook.before_update(ctx).await? {
                return Ok(Some((hook.name().to_string(), reason)));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for point in HookPoint::ALL {
            let names: Vec<&str> = self.hooks_for(point).iter().map(|h| h.name()).collect();
            if !names.is_empty() {
                map.entry(&point.as_str(), &names);
            }
        }
        map.finish()
    }
}
