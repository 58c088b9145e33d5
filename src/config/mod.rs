// mongoarchive/src/config/mod.rs
use std::env;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::{BackupError, Result};

pub const ENV_DATABASE: &str = "BACKUP_MONGO_DATABASE";
pub const ENV_SCHEDULE: &str = "BACKUP_SCHEDULE";
pub const ENV_HOST: &str = "BACKUP_MONGO_HOST";
pub const ENV_PORT: &str = "BACKUP_MONGO_PORT";
pub const ENV_USERNAME: &str = "BACKUP_MONGO_USERNAME";
pub const ENV_PASSWORD: &str = "BACKUP_MONGO_PASSWORD";
pub const ENV_TMP_DIRECTORY: &str = "BACKUP_TMP_DIRECTORY";
pub const ENV_DUMP_BIN: &str = "BACKUP_MONGO_DUMP_BIN";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 27017;
const DEFAULT_TMP_DIRECTORY: &str = ".";
const DEFAULT_DUMP_BIN: &str = "mongodump";

/// Settings for the Mongo backup source, loaded from `BACKUP_*` environment variables.
#[derive(Clone)]
pub struct MongoSourceConfig {
    pub database: String,
    /// Only checked for presence; scheduling happens outside this tool.
    pub schedule: String,
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub tmp_directory: PathBuf,
    pub dump_binary: String,
}

impl MongoSourceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable lookup.
    ///
    /// Empty values count as unset. Every missing required variable is
    /// reported in a single `MissingConfiguration` error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let database = get(ENV_DATABASE);
        let schedule = get(ENV_SCHEDULE);

        let (database, schedule) = match (database, schedule) {
            (Some(database), Some(schedule)) => (database, schedule),
            (database, schedule) => {
                let mut missing = Vec::new();
                if database.is_none() {
                    missing.push(ENV_DATABASE.to_string());
                }
                if schedule.is_none() {
                    missing.push(ENV_SCHEDULE.to_string());
                }
                return Err(BackupError::MissingConfiguration { missing });
            }
        };

        let port = match get(ENV_PORT) {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                BackupError::InvalidConfiguration(format!("{} must be a valid port number, got '{}': {}", ENV_PORT, raw, e))
            })?,
            None => DEFAULT_PORT,
        };

        let config = MongoSourceConfig {
            database,
            schedule,
            host: get(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            username: get(ENV_USERNAME),
            password: get(ENV_PASSWORD),
            tmp_directory: PathBuf::from(get(ENV_TMP_DIRECTORY).unwrap_or_else(|| DEFAULT_TMP_DIRECTORY.to_string())),
            dump_binary: get(ENV_DUMP_BIN).unwrap_or_else(|| DEFAULT_DUMP_BIN.to_string()),
        };
        config.log_summary();
        Ok(config)
    }

    fn log_summary(&self) {
        debug!(target: "mongo", "Mongo data source - database name:  {}", self.database);
        debug!(target: "mongo", "Mongo data source - database host:  {}", self.host);
        debug!(target: "mongo", "Mongo data source - database port:  {}", self.port);
        if let Some(username) = &self.username {
            debug!(target: "mongo", "Mongo data source - database username:   {}", username);
        }
        debug!(target: "mongo", "Mongo data source - tmp target dir: {}", self.tmp_directory.display());
    }
}

impl fmt::Debug for MongoSourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MongoSourceConfig")
            .field("database", &self.database)
            .field("schedule", &self.schedule)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("tmp_directory", &self.tmp_directory)
            .field("dump_binary", &self.dump_binary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_required_variables_are_all_reported() {
        let err = MongoSourceConfig::from_lookup(lookup_from(&[])).unwrap_err();
        match err {
            BackupError::MissingConfiguration { missing } => {
                assert_eq!(missing, vec![ENV_DATABASE.to_string(), ENV_SCHEDULE.to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_schedule_only() {
        let err = MongoSourceConfig::from_lookup(lookup_from(&[(ENV_DATABASE, "shop")])).unwrap_err();
        match err {
            BackupError::MissingConfiguration { missing } => assert_eq!(missing, vec![ENV_SCHEDULE.to_string()]),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let err = MongoSourceConfig::from_lookup(lookup_from(&[(ENV_DATABASE, ""), (ENV_SCHEDULE, "0 3 * * *")]))
            .unwrap_err();
        assert!(matches!(err, BackupError::MissingConfiguration { ref missing } if missing == &[ENV_DATABASE]));
    }

    #[test]
    fn test_defaults_applied() -> anyhow::Result<()> {
        let config = MongoSourceConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "shop"),
            (ENV_SCHEDULE, "0 3 * * *"),
            (ENV_HOST, ""),
            (ENV_USERNAME, ""),
        ]))?;

        assert_eq!(config.database, "shop");
        assert_eq!(config.schedule, "0 3 * * *");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 27017);
        assert_eq!(config.username, None);
        assert_eq!(config.password, None);
        assert_eq!(config.tmp_directory, PathBuf::from("."));
        assert_eq!(config.dump_binary, "mongodump");
        Ok(())
    }

    #[test]
    fn test_all_values_read() -> anyhow::Result<()> {
        let config = MongoSourceConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "shop"),
            (ENV_SCHEDULE, "@daily"),
            (ENV_HOST, "mongo.internal"),
            (ENV_PORT, "27018"),
            (ENV_USERNAME, "backup"),
            (ENV_PASSWORD, "s3cret"),
            (ENV_TMP_DIRECTORY, "/var/tmp/backups"),
            (ENV_DUMP_BIN, "/opt/mongo/bin/mongodump"),
        ]))?;

        assert_eq!(config.host, "mongo.internal");
        assert_eq!(config.port, 27018);
        assert_eq!(config.username.as_deref(), Some("backup"));
        assert_eq!(config.password.as_deref(), Some("s3cret"));
        assert_eq!(config.tmp_directory, PathBuf::from("/var/tmp/backups"));
        assert_eq!(config.dump_binary, "/opt/mongo/bin/mongodump");
        Ok(())
    }

    #[test]
    fn test_invalid_port_rejected() {
        let err = MongoSourceConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "shop"),
            (ENV_SCHEDULE, "@daily"),
            (ENV_PORT, "not-a-port"),
        ]))
        .unwrap_err();
        assert!(matches!(err, BackupError::InvalidConfiguration(_)));

        let err = MongoSourceConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "shop"),
            (ENV_SCHEDULE, "@daily"),
            (ENV_PORT, "70000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, BackupError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_debug_output_redacts_password() -> anyhow::Result<()> {
        let config = MongoSourceConfig::from_lookup(lookup_from(&[
            (ENV_DATABASE, "shop"),
            (ENV_SCHEDULE, "@daily"),
            (ENV_USERNAME, "backup"),
            (ENV_PASSWORD, "s3cret"),
        ]))?;
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("****"));
        assert!(rendered.contains("backup"));
        Ok(())
    }
}
