// mongoarchive/src/backup/logic.rs
use chrono::Local;
use std::fs;
use tracing::{debug, error, info};

use super::ArchiveResult;
use super::db_dump::{archive_path, build_dump_args, find_dump_executable, redact_args, run_dump};
use crate::config::MongoSourceConfig;
use crate::errors::{BackupError, Result};

/// Produces gzip archives of a single Mongo database with `mongodump`.
#[derive(Debug, Clone)]
pub struct MongoBackupSource {
    config: MongoSourceConfig,
}

impl MongoBackupSource {
    pub fn new(config: MongoSourceConfig) -> Self {
        MongoBackupSource { config }
    }

    /// Loads the config from the environment. Fails with `MissingConfiguration`
    /// before anything is spawned.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(MongoSourceConfig::from_env()?))
    }

    pub fn config(&self) -> &MongoSourceConfig {
        &self.config
    }

    /// The redacted `mongodump` command line an archive taken now would run.
    pub fn preview_command(&self) -> Result<Vec<String>> {
        let file = archive_path(&self.config.tmp_directory, &Local::now())?;
        let mut command = vec![self.config.dump_binary.clone()];
        command.extend(redact_args(&build_dump_args(&self.config, &file)));
        Ok(command)
    }

    /// Dumps the database into `<tmp_directory>/<timestamp>.gz`.
    ///
    /// A non-zero exit yields `DumpFailed`; whatever the tool wrote is left on disk.
    pub async fn archive(&self) -> Result<ArchiveResult> {
        let time = Local::now();
        let file = archive_path(&self.config.tmp_directory, &time)?;

        if !self.config.tmp_directory.exists() {
            info!(target: "mongo", "Creating tmp directory {}", self.config.tmp_directory.display());
            fs::create_dir_all(&self.config.tmp_directory)?;
        }
        debug!(target: "mongo", "Archiving database to {}", file.display());

        let args = build_dump_args(&self.config, &file);
        debug!(target: "mongodump", "Executing mongodump {}", redact_args(&args).join(" "));

        let program = find_dump_executable(&self.config.dump_binary)?;
        let output = run_dump(&program, &args).await?;

        let message = match output.code {
            Some(code) => format!("child process exited with code {}", code),
            None => "child process terminated by signal".to_string(),
        };
        debug!(target: "mongodump", "{}", message);

        if !output.success() {
            error!(target: "mongodump", "{}", message);
            return Err(BackupError::DumpFailed {
                code: output.code,
                stderr: output.stderr.join("\n"),
            });
        }

        Ok(ArchiveResult { time, file })
    }
}
