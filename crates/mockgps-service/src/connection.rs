//! Bind contract between controllers and the service host

use std::sync::Arc;

use mockgps_core::prelude::*;

use crate::component::{BindFlags, ComponentName};
use crate::service::MockLocationBinder;

/// Callbacks for one bind request.
///
/// Invoked from a runtime task, never from the caller of `bind`. The host
/// holds its bookkeeping lock while a callback runs, so implementations must
/// not call back into the host.
pub trait ServiceConnection: Send + Sync {
    /// The bind handshake completed. Fires at most once per connection cycle.
    fn on_service_connected(&self, name: &ComponentName, binder: MockLocationBinder);

    /// The service went away while connected. The registration stays alive.
    fn on_service_disconnected(&self, name: &ComponentName);
}

/// Token for a live bind request.
///
/// Not `Clone`: `unbind` consumes it, so a registration is released at most once.
#[derive(Debug)]
pub struct BindRegistration {
    id: u64,
    component: ComponentName,
}

impl BindRegistration {
    pub(crate) fn new(id: u64, component: ComponentName) -> Self {
        Self { id, component }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn component(&self) -> &ComponentName {
        &self.component
    }
}

/// Service lifecycle operations.
///
/// None of these block: completion of a bind is signaled through the
/// [`ServiceConnection`] passed to [`ServiceHost::bind`].
pub trait ServiceHost: Send + Sync {
    /// Start the service if it is not running. Starting a running service is a no-op.
    fn start(&self, component: &ComponentName) -> Result<()>;

    /// Request a connection. The connected callback fires later, or never if the
    /// service is not running and `flags.auto_create` is false.
    fn bind(
        &self,
        component: &ComponentName,
        connection: Arc<dyn ServiceConnection>,
        flags: BindFlags,
    ) -> Result<BindRegistration>;

    /// Release a connection. No callbacks fire for it afterwards.
    fn unbind(&self, registration: BindRegistration) -> Result<()>;
}
