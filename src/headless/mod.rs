//! Headless mode - NDJSON event output
//!
//! The headless frontend stands in for the phone screen. Everything the user
//! would see or feel (toasts, vibrations, map changes) and every binding
//! transition is written to stdout as one JSON object per line, so scripts
//! can drive the app over stdin and assert on its output.
//!
//! # Example Output
//!
//! ```json
//! {"event":"bound","component":"com.lilstiffy.mockgps/.service.MockLocationService","timestamp":1704700001000}
//! {"event":"toast","message":"Mocking location...","timestamp":1704700002000}
//! {"event":"vibrate","timestamp":1704700002001}
//! {"event":"toggled","outcome":"started","timestamp":1704700002002}
//! ```

pub mod console;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use mockgps_core::{CameraTarget, MapType, ToggleOutcome};

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// Transient notification shown to the user
    Toast { message: String, timestamp: i64 },

    /// Haptic pulse
    Vibrate { timestamp: i64 },

    /// Map widget switched rendering style
    MapTypeChanged { map_type: MapType, timestamp: i64 },

    /// Map camera moved
    CameraMoved {
        latitude: f64,
        longitude: f64,
        zoom: f32,
        timestamp: i64,
    },

    /// A toggle request was handled
    Toggled {
        outcome: ToggleOutcome,
        timestamp: i64,
    },

    /// Bind handshake completed
    Bound { component: String, timestamp: i64 },

    /// Bound service went away
    Unbound { component: String, timestamp: i64 },

    /// The service's mocking flag changed
    MockingChanged { is_mocking: bool, timestamp: i64 },

    /// The location override rejected an update
    OverrideFailed { message: String, timestamp: i64 },

    /// A bind request was abandoned
    BindTimedOut { attempt: u64, timestamp: i64 },

    /// Error occurred
    Error {
        message: String,
        fatal: bool,
        timestamp: i64,
    },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    // ─────────────────────────────────────────────────────────
    // Convenience constructors
    // ─────────────────────────────────────────────────────────

    pub fn toast(message: &str) -> Self {
        Self::Toast {
            message: message.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn vibrate() -> Self {
        Self::Vibrate {
            timestamp: Self::now(),
        }
    }

    pub fn map_type_changed(map_type: MapType) -> Self {
        Self::MapTypeChanged {
            map_type,
            timestamp: Self::now(),
        }
    }

    pub fn camera_moved(camera: CameraTarget) -> Self {
        Self::CameraMoved {
            latitude: camera.position.latitude,
            longitude: camera.position.longitude,
            zoom: camera.zoom,
            timestamp: Self::now(),
        }
    }

    pub fn toggled(outcome: ToggleOutcome) -> Self {
        Self::Toggled {
            outcome,
            timestamp: Self::now(),
        }
    }

    pub fn bound(component: &str) -> Self {
        Self::Bound {
            component: component.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn unbound(component: &str) -> Self {
        Self::Unbound {
            component: component.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn mocking_changed(is_mocking: bool) -> Self {
        Self::MockingChanged {
            is_mocking,
            timestamp: Self::now(),
        }
    }

    pub fn override_failed(message: &str) -> Self {
        Self::OverrideFailed {
            message: message.to_string(),
            timestamp: Self::now(),
        }
    }

    pub fn bind_timed_out(attempt: u64) -> Self {
        Self::BindTimedOut {
            attempt,
            timestamp: Self::now(),
        }
    }

    pub fn error(message: String, fatal: bool) -> Self {
        Self::Error {
            message,
            fatal,
            timestamp: Self::now(),
        }
    }
}
