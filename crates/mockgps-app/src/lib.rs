//! mockgps-app - Host controller and orchestration for Mock GPS
//!
//! This crate implements the foreground side of the mock toggle: the
//! [`HostController`] that binds to the mock location service, the
//! [`Engine`] message loop around it, the map screen state and
//! configuration loading. Platform capabilities arrive as trait objects
//! bundled in [`Platform`].

pub mod binding;
pub mod config;
pub mod controller;
pub mod engine;
pub mod engine_event;
pub mod map;
pub mod message;
pub mod platform;
pub mod signals;

#[cfg(test)]
mod test_support;

// Re-export primary types
pub use binding::{BindingSlot, ServiceBinding};
pub use config::Settings;
pub use controller::HostController;
pub use engine::Engine;
pub use engine_event::EngineEvent;
pub use map::MapScreen;
pub use message::Message;
pub use platform::{Haptics, MapSurface, Notifier, PermissionChecker, Platform};
