//! Core domain types for Mock GPS

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Zoom level used for the initial camera position
pub const DEFAULT_ZOOM: f32 = 10.0;

/// Initial camera position (Jakarta)
pub const DEFAULT_CAMERA_TARGET: CameraTarget = CameraTarget {
    position: LatLng {
        latitude: -6.2,
        longitude: 106.8,
    },
    zoom: DEFAULT_ZOOM,
};

// ─────────────────────────────────────────────────────────────────
// Coordinates
// ─────────────────────────────────────────────────────────────────

/// A position on the globe in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    /// Create a validated coordinate.
    ///
    /// Latitude must be within `-90..=90`, longitude within `-180..=180`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if !valid {
            return Err(Error::InvalidCoordinate {
                latitude,
                longitude,
            });
        }

        Ok(Self {
            latitude,
            longitude,
        })
    }
}

impl Default for LatLng {
    fn default() -> Self {
        DEFAULT_CAMERA_TARGET.position
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

// ─────────────────────────────────────────────────────────────────
// Map
// ─────────────────────────────────────────────────────────────────

/// Map rendering style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    #[default]
    Normal,
    Satellite,
    Hybrid,
}

impl MapType {
    /// All selectable map types, in menu order
    pub const ALL: [MapType; 3] = [MapType::Normal, MapType::Satellite, MapType::Hybrid];

    /// Label shown in the map type selector
    pub fn label(&self) -> &'static str {
        match self {
            MapType::Normal => "Normal",
            MapType::Satellite => "Satellite",
            MapType::Hybrid => "Hybrid",
        }
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MapType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MapType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_map_type(s))
    }
}

/// Camera position of the map widget
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraTarget {
    pub position: LatLng,
    pub zoom: f32,
}

impl CameraTarget {
    pub fn new(position: LatLng, zoom: f32) -> Self {
        Self { position, zoom }
    }

    /// Same zoom, new position
    pub fn with_position(self, position: LatLng) -> Self {
        Self { position, ..self }
    }
}

impl Default for CameraTarget {
    fn default() -> Self {
        DEFAULT_CAMERA_TARGET
    }
}

// ─────────────────────────────────────────────────────────────────
// Toggle Outcome
// ─────────────────────────────────────────────────────────────────

/// Result of a "toggle mocking" request.
///
/// Exactly one outcome is produced per request. Only `Started` and `Stopped`
/// involve the service; the other two leave its state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// Service flipped to mocking
    Started,
    /// Service flipped to not mocking
    Stopped,
    /// Permission granted but no bound service
    NotBound,
    /// Location permission missing
    PermissionDenied,
}

impl ToggleOutcome {
    /// Short user-facing notification text
    pub fn message(&self) -> &'static str {
        match self {
            ToggleOutcome::Started => "Mocking location...",
            ToggleOutcome::Stopped => "Stopped mocking location...",
            ToggleOutcome::NotBound => "Service not bound",
            ToggleOutcome::PermissionDenied => "No Location permission",
        }
    }

    /// Whether the service is mocking after this outcome.
    ///
    /// This is the value returned to the caller of the toggle action.
    pub fn is_mocking(&self) -> bool {
        matches!(self, ToggleOutcome::Started)
    }

    /// Whether this outcome is accompanied by a haptic pulse
    pub fn vibrates(&self) -> bool {
        matches!(self, ToggleOutcome::Started | ToggleOutcome::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlng_valid() {
        let pos = LatLng::new(52.52, 13.405).unwrap();
        assert_eq!(pos.latitude, 52.52);
        assert_eq!(pos.longitude, 13.405);
    }

    #[test]
    fn test_latlng_bounds_inclusive() {
        assert!(LatLng::new(90.0, 180.0).is_ok());
        assert!(LatLng::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_latlng_rejects_out_of_range() {
        assert!(matches!(
            LatLng::new(90.5, 0.0),
            Err(Error::InvalidCoordinate { .. })
        ));
        assert!(LatLng::new(0.0, -181.0).is_err());
        assert!(LatLng::new(f64::NAN, 0.0).is_err());
        assert!(LatLng::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_default_camera_is_jakarta_zoom_10() {
        let camera = CameraTarget::default();
        assert_eq!(camera.position.latitude, -6.2);
        assert_eq!(camera.position.longitude, 106.8);
        assert_eq!(camera.zoom, 10.0);
    }

    #[test]
    fn test_camera_with_position_keeps_zoom() {
        let camera = CameraTarget::new(LatLng::default(), 14.0);
        let moved = camera.with_position(LatLng::new(1.0, 2.0).unwrap());
        assert_eq!(moved.zoom, 14.0);
        assert_eq!(moved.position.latitude, 1.0);
    }

    #[test]
    fn test_map_type_labels() {
        let labels: Vec<_> = MapType::ALL.iter().map(|t| t.label()).collect();
        assert_eq!(labels, vec!["Normal", "Satellite", "Hybrid"]);
        assert_eq!(MapType::default(), MapType::Normal);
    }

    #[test]
    fn test_map_type_from_str() {
        assert_eq!("satellite".parse::<MapType>().unwrap(), MapType::Satellite);
        assert_eq!(" HYBRID ".parse::<MapType>().unwrap(), MapType::Hybrid);
        assert!(matches!(
            "terrain".parse::<MapType>(),
            Err(Error::InvalidMapType { .. })
        ));
    }

    #[test]
    fn test_map_type_serde_lowercase() {
        let json = serde_json::to_string(&MapType::Satellite).unwrap();
        assert_eq!(json, "\"satellite\"");
    }

    #[test]
    fn test_toggle_outcome_messages() {
        assert_eq!(ToggleOutcome::Started.message(), "Mocking location...");
        assert_eq!(
            ToggleOutcome::Stopped.message(),
            "Stopped mocking location..."
        );
        assert_eq!(ToggleOutcome::NotBound.message(), "Service not bound");
        assert_eq!(
            ToggleOutcome::PermissionDenied.message(),
            "No Location permission"
        );
    }

    #[test]
    fn test_toggle_outcome_flags() {
        assert!(ToggleOutcome::Started.is_mocking());
        assert!(!ToggleOutcome::Stopped.is_mocking());
        assert!(!ToggleOutcome::NotBound.is_mocking());
        assert!(!ToggleOutcome::PermissionDenied.is_mocking());

        assert!(ToggleOutcome::Started.vibrates());
        assert!(ToggleOutcome::Stopped.vibrates());
        assert!(!ToggleOutcome::NotBound.vibrates());
        assert!(!ToggleOutcome::PermissionDenied.vibrates());
    }
}
