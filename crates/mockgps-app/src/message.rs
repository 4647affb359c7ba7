//! Message types for the engine loop

use mockgps_core::{LatLng, MapType, ServiceEvent};

/// All inputs processed by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// User pressed the mock toggle
    ToggleMocking,

    /// User picked a map rendering style
    SelectMapType(MapType),

    /// User picked the coordinate to report while mocking
    SelectLocation(LatLng),

    /// Callback or notification from the bound service
    Service(ServiceEvent),

    /// The bind request `attempt` did not complete in time
    BindTimedOut { attempt: u64 },

    /// Drop any pending bind and bind again
    RetryBind,

    /// Leave the event loop
    Quit,
}
