//! CLI argument definitions using clap
//!
//! Commands:
//! - docdb-utils uri <name> [--config <path>]
//! - docdb-utils ping <name> [--config <path>] [--in-memory]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docdb-utils - connection and schema helpers for document databases
#[derive(Parser, Debug)]
#[command(name = "docdb-utils")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the connection string that would be used for a database
    Uri {
        /// Logical database name
        name: String,

        /// Optional JSON connection config
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Connect, round-trip a ping to the server and report the outcome
    Ping {
        /// Logical database name
        name: String,

        /// Optional JSON connection config
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use the in-memory driver instead of MongoDB
        #[arg(long)]
        in_memory: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
