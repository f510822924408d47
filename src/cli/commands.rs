//! CLI command implementations

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::connection::{ConnectionConfig, ConnectionString, Connector};
use crate::store::{Driver, MemoryDriver, MongoDriver};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Parse args and run the selected command
pub async fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command).await
}

/// Run the appropriate command based on CLI args
pub async fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Uri { name, config } => uri(&load_config(&name, config.as_deref())?),
        Command::Ping {
            name,
            config,
            in_memory,
        } => {
            let config = load_config(&name, config.as_deref())?;
            ping(&config, select_driver(in_memory)).await
        }
    }
}

/// Seconds `ping` waits for a reachable MongoDB server
const PING_TIMEOUT_SECS: u64 = 5;

fn select_driver(in_memory: bool) -> Arc<dyn Driver> {
    if in_memory {
        Arc::new(MemoryDriver::new())
    } else {
        Arc::new(
            MongoDriver::new()
                .with_server_selection_timeout(Duration::from_secs(PING_TIMEOUT_SECS))
                .with_app_name("docdb-utils"),
        )
    }
}

/// Config from a JSON file, or from the environment when no file is given.
///
/// The file's `database` field is replaced by the name given on the
/// command line.
pub fn load_config(name: &str, path: Option<&Path>) -> CliResult<ConnectionConfig> {
    let Some(path) = path else {
        return Ok(ConnectionConfig::from_env(name));
    };

    let content = fs::read_to_string(path).map_err(|e| {
        CliError::config_error(format!("Failed to read config {}: {}", path.display(), e))
    })?;
    let mut raw: serde_json::Value = serde_json::from_str(&content)?;
    if let Some(obj) = raw.as_object_mut() {
        obj.insert("database".to_string(), json!(name));
    }
    Ok(serde_json::from_value(raw)?)
}

/// Print the resolved connection string, password masked
pub fn uri(config: &ConnectionConfig) -> CliResult<()> {
    let parsed = ConnectionString::parse(&config.resolve_uri())?;
    write_response(json!({
        "database": parsed.database.as_deref().unwrap_or(&config.database),
        "uri": parsed.redacted(),
    }))
}

/// Connect, ping the server and report the outcome
pub async fn ping(config: &ConnectionConfig, driver: Arc<dyn Driver>) -> CliResult<()> {
    let driver_name = driver.name().to_string();
    let connector = Connector::new(driver);
    let result = match connector.connect_with_config(config).await {
        Ok(db) => db.ping().await.map(|()| db),
        Err(e) => Err(e),
    };

    match result {
        Ok(db) => write_response(json!({
            "database": db.name(),
            "driver": driver_name,
            "connected": true,
        })),
        Err(e) => {
            let err = CliError::from(e);
            write_error(err.code_str(), err.message())?;
            Err(err)
        }
    }
}
