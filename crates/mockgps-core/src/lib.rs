//! # mockgps-core - Core Domain Types
//!
//! Foundation crate for Mock GPS. Provides domain types, error handling,
//! event definitions and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`LatLng`] - Validated latitude/longitude pair
//! - [`MapType`] - Map rendering style (Normal, Satellite, Hybrid)
//! - [`CameraTarget`] - Map camera position and zoom level
//! - [`ToggleOutcome`] - Result of a "toggle mocking" request, with its user message
//!
//! ### Events (`events`)
//! - [`ServiceEvent`] - Lifecycle and state notifications coming from the mock service
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use mockgps_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Mock GPS crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use events::ServiceEvent;
pub use types::{
    CameraTarget, LatLng, MapType, ToggleOutcome, DEFAULT_CAMERA_TARGET, DEFAULT_ZOOM,
};
