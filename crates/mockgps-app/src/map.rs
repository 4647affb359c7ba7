//! Map screen state
//!
//! Keeps the selected map type and camera, and forwards changes to the map
//! widget. Rendering itself is the widget's business.

use mockgps_core::{CameraTarget, LatLng, MapType};

use crate::platform::MapSurface;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MapScreen {
    map_type: MapType,
    camera: CameraTarget,
}

impl MapScreen {
    pub fn new(map_type: MapType, camera: CameraTarget) -> Self {
        Self { map_type, camera }
    }

    pub fn map_type(&self) -> MapType {
        self.map_type
    }

    pub fn camera(&self) -> CameraTarget {
        self.camera
    }

    /// Text of the map type selector button
    pub fn selector_label(&self) -> String {
        format!("Map Type: {}", self.map_type.label())
    }

    /// Push the full screen state to a freshly created widget
    pub fn render(&self, surface: &dyn MapSurface) {
        surface.set_map_type(self.map_type);
        surface.move_camera(self.camera);
    }

    /// Switch map type. Returns false if it was already selected.
    pub fn select_map_type(&mut self, map_type: MapType, surface: &dyn MapSurface) -> bool {
        if self.map_type == map_type {
            return false;
        }
        self.map_type = map_type;
        surface.set_map_type(map_type);
        true
    }

    /// Center the camera on `position`, keeping the zoom level
    pub fn move_to(&mut self, position: LatLng, surface: &dyn MapSurface) {
        self.camera = self.camera.with_position(position);
        surface.move_camera(self.camera);
    }
}
