// mongoarchive/src/backup/db_dump.rs
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use which::which;

use crate::config::MongoSourceConfig;
use crate::errors::{BackupError, Result};

const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d__%H-%M-%S";
const REDACTED: &str = "****";
/// Stderr lines kept for the `DumpFailed` error.
pub const STDERR_TAIL_LINES: usize = 50;

/// What the dump process left behind once it exited.
#[derive(Debug)]
pub struct DumpOutput {
    pub code: Option<i32>,
    /// Last `STDERR_TAIL_LINES` lines of stderr.
    pub stderr: Vec<String>,
}

impl DumpOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Filesystem-safe rendering of the capture time, e.g. `2024-05-01__13-45-10`.
pub fn archive_timestamp(time: &DateTime<Local>) -> String {
    time.format(ARCHIVE_TIMESTAMP_FORMAT).to_string()
}

/// Absolute, `..`-free path of the archive for a capture taken at `time`.
pub fn archive_path(tmp_directory: &Path, time: &DateTime<Local>) -> Result<PathBuf> {
    let file = tmp_directory.join(format!("{}.gz", archive_timestamp(time)));
    Ok(normalize(&std::path::absolute(file)?))
}

// Lexical only; symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Arguments passed to `mongodump`. Credential flags are only added when a
/// username is configured; a missing password is forwarded as an empty value.
pub fn build_dump_args(config: &MongoSourceConfig, archive: &Path) -> Vec<String> {
    let mut args = vec![
        "--db".to_string(),
        config.database.clone(),
        "--host".to_string(),
        config.host.clone(),
        "--port".to_string(),
        config.port.to_string(),
        format!("--archive={}", archive.display()),
        "--gzip".to_string(),
    ];
    if let Some(username) = &config.username {
        args.push("--username".to_string());
        args.push(username.clone());
        args.push("--password".to_string());
        args.push(config.password.clone().unwrap_or_default());
    }
    args
}

/// Copy of `args` safe for logging.
pub fn redact_args(args: &[String]) -> Vec<String> {
    let mut redacted = Vec::with_capacity(args.len());
    let mut hide_next = false;
    for arg in args {
        if hide_next {
            redacted.push(REDACTED.to_string());
            hide_next = false;
            continue;
        }
        hide_next = arg == "--password";
        redacted.push(arg.clone());
    }
    redacted
}

pub fn find_dump_executable(binary: &str) -> Result<PathBuf> {
    which(binary).map_err(|source| BackupError::DumpToolNotFound {
        binary: binary.to_string(),
        source,
    })
}

/// Runs the dump tool to completion, forwarding every output line to the log.
pub async fn run_dump(program: &Path, args: &[String]) -> Result<DumpOutput> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(BackupError::Spawn)?;

    let stdout_task = child.stdout.take().map(|out| forward_lines(out, "stdout", 0));
    let stderr_task = child.stderr.take().map(|err| forward_lines(err, "stderr", STDERR_TAIL_LINES));

    let status = child.wait().await.map_err(BackupError::Spawn)?;

    if let Some(task) = stdout_task {
        join_forwarder(task, "stdout").await;
    }
    let stderr = match stderr_task {
        Some(task) => join_forwarder(task, "stderr").await,
        None => Vec::new(),
    };

    Ok(DumpOutput {
        code: status.code(),
        stderr,
    })
}

async fn join_forwarder(task: JoinHandle<Vec<String>>, stream: &str) -> Vec<String> {
    task.await.unwrap_or_else(|e| {
        warn!(target: "mongodump", "{} forwarder failed: {}", stream, e);
        Vec::new()
    })
}

/// Logs each line of `reader` and returns the last `keep` of them.
///
/// Bytes are decoded lossily. The pipe is drained until EOF even after a
/// read error, so the child never gets SIGPIPE from us.
fn forward_lines<R>(reader: R, stream: &'static str, keep: usize) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut tail = VecDeque::with_capacity(keep);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    debug!(target: "mongodump", "{}: {}", stream, line);
                    if keep > 0 {
                        if tail.len() == keep {
                            tail.pop_front();
                        }
                        tail.push_back(line.to_string());
                    }
                }
                Err(e) => {
                    warn!(target: "mongodump", "{} read error, discarding the rest: {}", stream, e);
                    if let Err(e) = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await {
                        warn!(target: "mongodump", "{} could not be drained: {}", stream, e);
                    }
                    break;
                }
            }
        }
        tail.into_iter().collect()
    })
}
