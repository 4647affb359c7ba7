//! Mock GPS Library
//!
//! Headless frontend for the mock location toggle: a host controller bound
//! to an in-process mock location service, driven from stdin.

pub mod headless;

use std::path::Path;

use mockgps_core::prelude::*;

pub use headless::runner::{parse_command, run_headless, HeadlessOptions, StdinCommand};

/// Application entry point for a project directory
pub async fn run(project_path: &Path, options: HeadlessOptions) -> Result<()> {
    color_eyre::install().map_err(|e| Error::startup(e.to_string()))?;

    // Logs go to a file, stdout carries the NDJSON stream
    let log_file = mockgps_core::logging::init()?;
    eprintln!("Logging to {}", log_file.display());

    let result = run_headless(project_path, options).await;

    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    result
}

/// Write `.mockgps/config.toml` with defaults. Returns the config path.
pub fn init_project(project_path: &Path) -> Result<std::path::PathBuf> {
    mockgps_app::config::init_config_dir(project_path)?;
    Ok(mockgps_app::config::config_path(project_path))
}
