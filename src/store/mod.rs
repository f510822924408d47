//! Storage layer
//!
//! The helpers never talk to a database directly: they go through a
//! `StorageBackend` obtained from a `Driver`. `MongoDriver` talks to a
//! MongoDB server; the in-memory pair (`MemoryDriver`, `MemoryStore`)
//! backs tests and local tooling.

mod backend;
mod codec;
mod driver;
mod filter;
mod mongo;
mod update;

pub use backend::{MemoryStore, StorageBackend, StoreFuture};
pub use driver::{Driver, MemoryDriver, OpenFuture};
pub use mongo::{mongo_error, MongoDriver, MongoStore};
pub use filter::Filter;
pub use update::UpdatePayload;
