//! Observability for docdb-utils
//!
//! Structured JSON logging with typed events. Observability is read-only:
//! a failing sink never changes the outcome of the operation being logged.
//!
//! ```ignore
//! use docdb_utils::observability::{Event, Logger};
//!
//! let logger = Logger::stdout();
//! logger.info(Event::ConnectionOpen, &[("database", "shop")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{LogSink, Logger, MemorySink, Severity, StdSink};
