use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info";

/// Installs the fmt subscriber. `RUST_LOG` overrides the default filter, e.g.
/// `RUST_LOG=mongo=debug,mongodump=debug` to see the dump tool's output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Logs a `.env` loading problem. A missing file is not one.
pub fn report_dotenv(result: &Result<PathBuf, dotenv::Error>) {
    if let Some(message) = dotenv_warning(result) {
        warn!("{}", message);
    }
}

fn dotenv_warning(result: &Result<PathBuf, dotenv::Error>) -> Option<String> {
    match result {
        Ok(_) => None,
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => Some(format!("Ignoring .env file: {}", e)),
    }
}
