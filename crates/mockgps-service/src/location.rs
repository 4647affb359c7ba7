//! Location override mechanism
//!
//! The actual substitution of the device position is platform specific. The
//! service only needs to push a coordinate while mocking and clear it when
//! mocking stops.

use std::sync::Mutex;

use mockgps_core::prelude::*;
use mockgps_core::LatLng;

/// Substitutes the position reported by the platform location provider
#[trait_variant::make(LocationOverride: Send)]
pub trait LocalLocationOverride {
    /// Report `position` as the current device location
    async fn set(&self, position: LatLng) -> Result<()>;

    /// Stop overriding and let the real provider report again
    async fn clear(&self) -> Result<()>;
}

/// Override that only records what it would report.
///
/// Used by the headless binary, where no platform provider exists.
#[derive(Debug, Default)]
pub struct TracingOverride {
    current: Mutex<Option<LatLng>>,
}

impl TracingOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position currently being reported, if overriding
    pub fn current(&self) -> Option<LatLng> {
        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn store(&self, position: Option<LatLng>) {
        *self
            .current
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = position;
    }
}

impl LocationOverride for TracingOverride {
    async fn set(&self, position: LatLng) -> Result<()> {
        debug!("Override position: {}", position);
        self.store(Some(position));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        info!("Override cleared");
        self.store(None);
        Ok(())
    }
}
