//! Settings parser for .mockgps/config.toml

use std::path::{Path, PathBuf};

use super::types::Settings;
use mockgps_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const MOCKGPS_DIR: &str = ".mockgps";

const DEFAULT_CONFIG: &str = r#"# Mock GPS Configuration

[service]
# Give up on binding to the background service after this long (0 = wait forever)
bind_timeout_ms = 10000
# Re-push the mocked position at this interval while mocking
update_interval_ms = 1000
# Artificial latency before the service's connect callback
connect_delay_ms = 0

[map]
# normal | satellite | hybrid
map_type = "normal"
latitude = -6.2
longitude = 106.8
zoom = 10.0

[feedback]
# Vibrate when mocking starts or stops
haptics = true
"#;

/// Path of the settings file for a project directory
pub fn config_path(project_path: &Path) -> PathBuf {
    project_path.join(MOCKGPS_DIR).join(CONFIG_FILENAME)
}

/// Load settings from `.mockgps/config.toml`.
///
/// A missing file yields defaults; an unreadable or invalid one is logged and
/// also yields defaults.
pub fn load_settings(project_path: &Path) -> Settings {
    let config_path = config_path(project_path);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    read_settings(&config_path).unwrap_or_else(|e| {
        warn!("Using default settings: {}", e);
        Settings::default()
    })
}

/// Read and parse one settings file
fn read_settings(config_path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {:?}", config_path))?;
    let settings = toml::from_str(&content)
        .map_err(|e| Error::config(e.to_string()))
        .with_context(|| format!("Failed to parse {:?}", config_path))?;

    debug!("Loaded settings from {:?}", config_path);
    Ok(settings)
}

/// Create `.mockgps/config.toml` with commented defaults if it does not exist
pub fn init_config_dir(project_path: &Path) -> Result<()> {
    let mockgps_dir = project_path.join(MOCKGPS_DIR);

    if !mockgps_dir.exists() {
        std::fs::create_dir_all(&mockgps_dir)
            .map_err(|e| Error::config(format!("Failed to create .mockgps dir: {}", e)))?;
    }

    let config_path = mockgps_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, DEFAULT_CONFIG)
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgps_core::MapType;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_returns_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_load_custom_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(MOCKGPS_DIR)).unwrap();
        std::fs::write(
            config_path(dir.path()),
            r#"
[service]
bind_timeout_ms = 0

[map]
map_type = "satellite"
latitude = 51.5074
longitude = -0.1278

[feedback]
haptics = false
"#,
        )
        .unwrap();

        let settings = load_settings(dir.path());
        assert_eq!(settings.service.bind_timeout(), None);
        assert_eq!(settings.map.map_type, MapType::Satellite);
        assert_eq!(settings.map.camera().position.latitude, 51.5074);
        assert!(!settings.feedback.haptics);
    }

    #[test]
    fn test_invalid_config_returns_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(MOCKGPS_DIR)).unwrap();
        std::fs::write(config_path(dir.path()), "[map]\nmap_type = \"terrain\"\n").unwrap();

        assert_eq!(load_settings(dir.path()), Settings::default());
        assert!(matches!(
            read_settings(&config_path(dir.path())),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_unreadable_config_returns_defaults() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read
        std::fs::create_dir_all(config_path(dir.path())).unwrap();

        assert!(matches!(
            read_settings(&config_path(dir.path())),
            Err(Error::Io(_))
        ));
        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_default_config_lists_every_service_key() {
        let dir = TempDir::new().unwrap();
        init_config_dir(dir.path()).unwrap();

        let content = std::fs::read_to_string(config_path(dir.path())).unwrap();
        let table: toml::Table = toml::from_str(&content).unwrap();
        let service = table["service"].as_table().unwrap();
        for key in ["bind_timeout_ms", "update_interval_ms", "connect_delay_ms"] {
            assert!(service.contains_key(key), "missing {}", key);
        }
        assert_eq!(service["connect_delay_ms"].as_integer(), Some(0));
    }

    #[test]
    fn test_init_writes_parseable_defaults() {
        let dir = TempDir::new().unwrap();
        init_config_dir(dir.path()).unwrap();

        let path = config_path(dir.path());
        assert!(path.exists());
        assert_eq!(load_settings(dir.path()), Settings::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(MOCKGPS_DIR)).unwrap();
        std::fs::write(config_path(dir.path()), "[feedback]\nhaptics = false\n").unwrap();

        init_config_dir(dir.path()).unwrap();

        assert!(!load_settings(dir.path()).feedback.haptics);
    }
}
