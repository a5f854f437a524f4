//! Tracing subscriber setup.
//!
//! The filter is read from `SBD_LOG`, then `RUST_LOG`. CLI commands default
//! to `warn` on stderr so JSON on stdout stays clean. The server defaults to
//! `info` and also writes JSON lines to a daily-rotated file under the data
//! directory's `logs/`.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{Error, Result};

pub const LOG_ENV: &str = "SBD_LOG";
const LOG_FILE_PREFIX: &str = "sbd";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize stderr logging for one-shot CLI commands.
pub fn init_cli() {
    // A subscriber may already be installed (tests); that's fine.
    let _ = tracing_subscriber::registry()
        .with(env_filter("warn"))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

/// Initialize logging for the server: stderr plus a daily JSON log file.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the server.
pub fn init_server(logs_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(logs_dir)
        .map_err(|e| Error::Other(format!("Failed to open log file: {}", e)))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(fmt::layer().json().with_ansi(false).with_writer(writer))
        .try_init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_server_creates_logs_dir() {
        let dir = TempDir::new().unwrap();
        let logs = dir.path().join("logs");
        let guard = init_server(&logs).unwrap();
        tracing::info!("server log line");
        drop(guard);
        assert!(logs.is_dir());
    }
}
