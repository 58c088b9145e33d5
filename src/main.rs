//! Mongo backup source
//!
//! Runs `mongodump` against the database named in the environment and
//! reports the timestamped archive it produced.

// mongoarchive/src/main.rs
mod backup;
mod config;
mod errors;
mod utils;

use anyhow::{Context, Result};
use backup::MongoBackupSource;
use std::env;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> ExitCode {
    // Loaded before logging so RUST_LOG may come from .env; problems are reported once logging is up.
    let dotenv_result = dotenv::dotenv();
    utils::init_logging();
    utils::report_dotenv(&dotenv_result);

    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let choice = args.get(1).map(|s| s.trim().to_string()).unwrap_or_else(|| "archive".to_string());

    let source = MongoBackupSource::from_env().context("Failed to load Mongo data source configuration")?;

    match choice.as_str() {
        "archive" => {
            info!(target: "mongo", "Starting archive of database {}", source.config().database);
            let result = source.archive().await.context("Archive process failed")?;
            info!(target: "mongo", "Archive captured at {} written to {}", result.time_string(), result.file.display());
            println!("{}", serde_json::to_string(&result).context("Failed to serialize archive result")?);
        }
        "config" => {
            println!("{:#?}", source.config());
        }
        "args" => {
            let command = source.preview_command().context("Failed to build mongodump command")?;
            println!("{}", command.join(" "));
        }
        other => {
            anyhow::bail!("Invalid command '{}'. Use 'archive', 'config' or 'args'.", other);
        }
    }
    Ok(())
}
