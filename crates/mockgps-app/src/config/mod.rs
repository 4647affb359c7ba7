//! Configuration file parsing for Mock GPS
//!
//! Supports:
//! - `.mockgps/config.toml` - Service, map and feedback settings

pub mod settings;
pub mod types;

pub use settings::{config_path, init_config_dir, load_settings};
pub use types::*;
