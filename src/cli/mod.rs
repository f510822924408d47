//! CLI module for docdb-utils
//!
//! Provides command-line interface for:
//! - uri: print the resolved connection string
//! - ping: open a connection and report the outcome

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{load_config, ping, run, run_command, uri};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
