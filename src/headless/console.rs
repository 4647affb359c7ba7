//! Platform collaborators that report to stdout

use mockgps_app::{Haptics, MapSurface, Notifier, PermissionChecker};
use mockgps_core::{CameraTarget, MapType};

use super::HeadlessEvent;

/// Permission answer fixed at startup (`--deny-permission`)
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    granted: bool,
}

impl StaticPermissions {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl PermissionChecker for StaticPermissions {
    fn has_location_permission(&self) -> bool {
        self.granted
    }
}

#[derive(Debug, Default)]
pub struct ConsoleHaptics;

impl Haptics for ConsoleHaptics {
    fn vibrate(&self) {
        HeadlessEvent::vibrate().emit();
    }
}

#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_toast(&self, message: &str) {
        HeadlessEvent::toast(message).emit();
    }
}

#[derive(Debug, Default)]
pub struct ConsoleMapSurface;

impl MapSurface for ConsoleMapSurface {
    fn set_map_type(&self, map_type: MapType) {
        HeadlessEvent::map_type_changed(map_type).emit();
    }

    fn move_camera(&self, camera: CameraTarget) {
        HeadlessEvent::camera_moved(camera).emit();
    }
}
