//! Schemas, field validators and pre-update hooks
//!
//! # Design Principles
//!
//! - Schemas are declared once at startup and shared read-only afterwards
//! - Field types are checked on create and save; no implicit coercion
//! - Interceptors are an explicit ordered list per hook point, each
//!   returning allow or reject
//! - Validator faults propagate as errors

mod hooks;
mod readonly;
mod types;
mod validator;
mod validators;

pub use hooks::{HookDecision, HookFuture, HookPoint, HookRegistry, PreUpdateHook, UpdateContext};
pub use readonly::{install_readonly_guard, ReadonlyGuard};
pub use types::{FieldDef, FieldType, ModelSchema};
pub use validator::{
    check_structure, run_validators, FieldValidator, MessageTemplate, ValidationContext,
    ValidationFuture, ValidatorProps,
};
pub use validators::{find_duplicates, MaxCount, Unique, UniqueArrayItem, Validate};
