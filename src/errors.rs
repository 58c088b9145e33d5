use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Missing required environment variables for Mongo data source: {}", .missing.join(", "))]
    MissingConfiguration { missing: Vec<String> },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Dump executable '{binary}' not found. Please ensure MongoDB database tools are installed and in your PATH.")]
    DumpToolNotFound {
        binary: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to run dump command: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("child process exited with code {}", describe_code(.code))]
    DumpFailed {
        code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
