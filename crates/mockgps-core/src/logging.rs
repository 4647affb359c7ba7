//! File logging for the headless binary
//!
//! stdout carries the NDJSON event stream, so diagnostics are written to a
//! daily-rotated file under the platform data directory instead. Verbosity
//! comes from [`LOG_ENV`], e.g. `MOCKGPS_LOG=mockgps_service=trace`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{Error, Result};

/// Environment variable holding `EnvFilter` directives
pub const LOG_ENV: &str = "MOCKGPS_LOG";

/// File name prefix; the appender adds `.YYYY-MM-DD`
const LOG_FILE_PREFIX: &str = "mockgps.log";

/// Workspace crates logged at `info` when [`LOG_ENV`] is unset
const APP_CRATES: [&str; 4] = ["mock_gps", "mockgps_app", "mockgps_service", "mockgps_core"];

/// Install the global subscriber. Returns today's log file.
pub fn init() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir).map_err(|e| {
        Error::startup(format!(
            "Failed to create log directory {}: {}",
            log_dir.display(),
            e
        ))
    })?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .try_init()
        .map_err(|e| Error::startup(format!("Failed to install logger: {}", e)))?;

    let log_file = current_log_file();
    tracing::info!("Logging to {}", log_file.display());
    Ok(log_file)
}

/// Directives used when [`LOG_ENV`] is unset or invalid
pub fn default_directives() -> String {
    let mut directives: Vec<String> = APP_CRATES
        .iter()
        .map(|krate| format!("{}=info", krate))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives()))
}

/// `<data_local_dir>/mock-gps/logs`, or `./mock-gps/logs` without one
pub fn log_directory() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mock-gps")
        .join("logs")
}

/// File the daily appender in `dir` writes to on `date` (UTC)
pub fn log_file_for(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}.{}", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
}

pub fn current_log_file() -> PathBuf {
    log_file_for(&log_directory(), Utc::now().date_naive())
}
