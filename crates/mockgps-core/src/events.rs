//! Domain event definitions

use serde::{Deserialize, Serialize};

/// Notifications produced on the service side of a binding.
///
/// Connection events come from the service manager's callbacks; state events
/// come from the service itself through its attached observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServiceEvent {
    /// Bind handshake completed
    Connected { component: String },

    /// Service went away while bound (process reclaimed)
    Disconnected { component: String },

    /// The service's mocking flag changed
    MockingChanged { is_mocking: bool },

    /// The location override rejected an update
    OverrideFailed { message: String },
}

impl ServiceEvent {
    /// Short description for logging
    pub fn summary(&self) -> String {
        match self {
            ServiceEvent::Connected { component } => format!("connected to {}", component),
            ServiceEvent::Disconnected { component } => {
                format!("disconnected from {}", component)
            }
            ServiceEvent::MockingChanged { is_mocking } => {
                format!("mocking changed to {}", is_mocking)
            }
            ServiceEvent::OverrideFailed { message } => format!("override failed: {}", message),
        }
    }
}
