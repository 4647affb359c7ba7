//! Platform collaborators consumed by the host controller
//!
//! Each trait is a narrow contract for something the platform provides:
//! permission checks, haptics, transient notifications and the map widget.
//! The service lifecycle contract lives in [`mockgps_service::ServiceHost`].

use std::sync::Arc;

use mockgps_core::{CameraTarget, MapType};
use mockgps_service::ServiceHost;

/// Location permission query. Synchronous, no side effects.
pub trait PermissionChecker: Send + Sync {
    fn has_location_permission(&self) -> bool;
}

/// Haptic feedback. Fire-and-forget; failures are ignored by implementations.
pub trait Haptics: Send + Sync {
    fn vibrate(&self);
}

/// Short transient text notification shown to the user
pub trait Notifier: Send + Sync {
    fn show_toast(&self, message: &str);
}

/// The map rendering widget
pub trait MapSurface: Send + Sync {
    fn set_map_type(&self, map_type: MapType);
    fn move_camera(&self, camera: CameraTarget);
}

/// Bundle of collaborators handed to a controller
#[derive(Clone)]
pub struct Platform {
    pub host: Arc<dyn ServiceHost>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub haptics: Arc<dyn Haptics>,
    pub notifier: Arc<dyn Notifier>,
    pub map_surface: Arc<dyn MapSurface>,
}
