//! Database handles and models
//!
//! A `Database` is an explicit handle returned by the connector. Schemas
//! are registered on it once and come back as `Model`s, which carry the
//! create/save/find/update operations.

mod database;
mod model;

pub use database::Database;
pub use model::Model;
