//! Mock GPS - toggle a mocked device location through a bound background service
//!
//! This is the binary entry point. All logic lives in the library.

use std::path::PathBuf;

use clap::Parser;
use mock_gps::HeadlessOptions;
use mockgps_core::prelude::*;

/// Mock GPS - toggle a mocked device location through a bound background service
#[derive(Parser, Debug)]
#[command(name = "mockgps")]
#[command(about = "Mock location toggle with NDJSON output", long_about = None)]
struct Args {
    /// Project directory holding `.mockgps/config.toml`
    #[arg(value_name = "PATH")]
    path: Option<PathBuf>,

    /// Report location permission as not granted
    #[arg(long)]
    deny_permission: bool,

    /// Delay the service connect callback by this many milliseconds
    #[arg(long, value_name = "MS")]
    connect_delay_ms: Option<u64>,

    /// Write a default config file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let project_path = args
        .path
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if args.init {
        let path = mock_gps::init_project(&project_path)?;
        eprintln!("Config written to {}", path.display());
        return Ok(());
    }

    mock_gps::run(
        &project_path,
        HeadlessOptions {
            deny_permission: args.deny_permission,
            connect_delay_ms: args.connect_delay_ms,
        },
    )
    .await
}
