mod logic;
pub(crate) mod db_dump; // Argument building and the mongodump subprocess

use chrono::{DateTime, Local, SecondsFormat};
use serde::Serialize;
use std::path::PathBuf;

pub use logic::MongoBackupSource;

/// A finished archive: when it was captured and where it landed.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveResult {
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Local>,
    pub file: PathBuf,
}

impl ArchiveResult {
    /// Capture time as RFC 3339 with second precision, e.g. `2024-05-01T13:45:10+02:00`.
    pub fn time_string(&self) -> String {
        self.time.to_rfc3339_opts(SecondsFormat::Secs, false)
    }
}

fn serialize_time<S>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Secs, false))
}
