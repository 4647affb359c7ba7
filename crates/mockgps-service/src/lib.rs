//! # mockgps-service - Mock Location Service
//!
//! The long-running background service that owns the mocking flag, and the
//! service manager that starts it and hands out bound references to it.
//!
//! Depends on [`mockgps_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Service
//! - [`MockLocationService`] - Holds `is_mocking` and the target coordinate, drives the override
//! - [`MockLocationBinder`] - Token delivered by a completed bind; yields the live service
//! - [`MockObserver`] - Back-reference from the service to its bound controller
//!
//! ### Lifecycle
//! - [`ServiceManager`] - In-process service registry implementing [`ServiceHost`]
//! - [`ServiceHost`] - `start` / `bind` / `unbind` contract consumed by controllers
//! - [`ServiceConnection`] - Connect/disconnect callbacks for one bind request
//! - [`BindRegistration`] - Token for one bind request, consumed by `unbind`
//! - [`ComponentName`], [`BindFlags`] - Service descriptor and bind options
//!
//! ### Location Override
//! - [`LocationOverride`] - The mechanism that substitutes the reported position
//! - [`TracingOverride`] - Override that records positions in the log

pub mod component;
pub mod connection;
pub mod location;
pub mod manager;
pub mod service;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

pub use component::{BindFlags, ComponentName};
pub use connection::{BindRegistration, ServiceConnection, ServiceHost};
pub use location::{LocalLocationOverride, LocationOverride, TracingOverride};
pub use manager::{ServiceManager, ServiceManagerConfig};
pub use service::{MockLocationBinder, MockLocationService, MockObserver, MockState};
