//! Configuration types for Mock GPS
//!
//! Defines:
//! - `Settings` - Application settings (`.mockgps/config.toml`)
//! - Section types for the service, map and feedback

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mockgps_core::prelude::*;
use mockgps_core::{CameraTarget, LatLng, MapType, DEFAULT_CAMERA_TARGET, DEFAULT_ZOOM};
use mockgps_service::ServiceManagerConfig;

/// Application settings (.mockgps/config.toml)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub map: MapSettings,

    #[serde(default)]
    pub feedback: FeedbackSettings,
}

/// Background service settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServiceSettings {
    /// Give up on a bind request after this many milliseconds (0 = wait forever)
    #[serde(default = "default_bind_timeout_ms")]
    pub bind_timeout_ms: u64,

    /// Artificial latency before the connect callback (simulated platforms only)
    #[serde(default)]
    pub connect_delay_ms: u64,

    /// How often an active override re-pushes its position
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            bind_timeout_ms: default_bind_timeout_ms(),
            connect_delay_ms: 0,
            update_interval_ms: default_update_interval_ms(),
        }
    }
}

impl ServiceSettings {
    /// Bind timeout, or `None` to wait indefinitely
    pub fn bind_timeout(&self) -> Option<Duration> {
        (self.bind_timeout_ms > 0).then(|| Duration::from_millis(self.bind_timeout_ms))
    }

    pub fn manager_config(&self) -> ServiceManagerConfig {
        ServiceManagerConfig {
            connect_delay: Duration::from_millis(self.connect_delay_ms),
            // A zero period would make the re-push ticker panic
            update_interval: Duration::from_millis(self.update_interval_ms.max(1)),
        }
    }
}

fn default_bind_timeout_ms() -> u64 {
    10_000
}

fn default_update_interval_ms() -> u64 {
    1_000
}

/// Initial map state
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MapSettings {
    #[serde(default)]
    pub map_type: MapType,

    #[serde(default = "default_latitude")]
    pub latitude: f64,

    #[serde(default = "default_longitude")]
    pub longitude: f64,

    #[serde(default = "default_zoom")]
    pub zoom: f32,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            map_type: MapType::default(),
            latitude: default_latitude(),
            longitude: default_longitude(),
            zoom: default_zoom(),
        }
    }
}

impl MapSettings {
    /// Initial camera; falls back to the default target for invalid coordinates
    pub fn camera(&self) -> CameraTarget {
        match LatLng::new(self.latitude, self.longitude) {
            Ok(position) => CameraTarget::new(position, self.zoom),
            Err(e) => {
                warn!("Ignoring configured camera position: {}", e);
                DEFAULT_CAMERA_TARGET
            }
        }
    }
}

fn default_latitude() -> f64 {
    DEFAULT_CAMERA_TARGET.position.latitude
}

fn default_longitude() -> f64 {
    DEFAULT_CAMERA_TARGET.position.longitude
}

fn default_zoom() -> f32 {
    DEFAULT_ZOOM
}

/// User feedback settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeedbackSettings {
    /// Vibrate when mocking starts or stops
    #[serde(default = "default_true")]
    pub haptics: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self { haptics: true }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.service.bind_timeout_ms, 10_000);
        assert_eq!(settings.service.update_interval_ms, 1_000);
        assert_eq!(settings.map.map_type, MapType::Normal);
        assert_eq!(settings.map.camera(), CameraTarget::default());
        assert!(settings.feedback.haptics);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [map]
            map_type = "hybrid"
            "#,
        )
        .unwrap();

        assert_eq!(settings.map.map_type, MapType::Hybrid);
        assert_eq!(settings.map.zoom, 10.0);
        assert_eq!(settings.service, ServiceSettings::default());
    }

    #[test]
    fn test_bind_timeout_zero_disables() {
        let service = ServiceSettings {
            bind_timeout_ms: 0,
            ..Default::default()
        };
        assert_eq!(service.bind_timeout(), None);
        assert_eq!(
            ServiceSettings::default().bind_timeout(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_manager_config_clamps_interval() {
        let service = ServiceSettings {
            update_interval_ms: 0,
            connect_delay_ms: 250,
            ..Default::default()
        };
        let config = service.manager_config();
        assert_eq!(config.update_interval, Duration::from_millis(1));
        assert_eq!(config.connect_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_camera_falls_back() {
        let map = MapSettings {
            latitude: 120.0,
            ..Default::default()
        };
        assert_eq!(map.camera(), DEFAULT_CAMERA_TARGET);
    }
}
