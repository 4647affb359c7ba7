//! Domain events emitted by the Engine for external consumers
//!
//! Events are broadcast after each processed message via
//! `Engine::subscribe()`. Frontends (the headless runner, tests) render them;
//! they never feed back into the engine.

use mockgps_core::{ServiceEvent, ToggleOutcome};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Toggle
    // ─────────────────────────────────────────────────────────
    /// A toggle request was handled
    Toggled { outcome: ToggleOutcome },

    // ─────────────────────────────────────────────────────────
    // Binding
    // ─────────────────────────────────────────────────────────
    /// Forwarded from the bound service or its connection
    Service(ServiceEvent),

    /// Bind `attempt` was abandoned after the configured timeout
    BindTimedOut { attempt: u64 },

    /// A bind request was rejected by the service host
    BindFailed { message: String },

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────
    /// The engine is shutting down
    Shutdown,
}

impl EngineEvent {
    /// Event type name for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::Toggled { .. } => "toggled",
            EngineEvent::Service(ServiceEvent::Connected { .. }) => "bound",
            EngineEvent::Service(ServiceEvent::Disconnected { .. }) => "unbound",
            EngineEvent::Service(ServiceEvent::MockingChanged { .. }) => "mocking_changed",
            EngineEvent::Service(ServiceEvent::OverrideFailed { .. }) => "override_failed",
            EngineEvent::BindTimedOut { .. } => "bind_timed_out",
            EngineEvent::BindFailed { .. } => "bind_failed",
            EngineEvent::Shutdown => "shutdown",
        }
    }
}
