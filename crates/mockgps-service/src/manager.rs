//! Service lifecycle management
//!
//! [`ServiceManager`] plays the role of the platform's service subsystem: it
//! instantiates services on `start` (or on a bind with auto-create), tracks
//! bind registrations and delivers connect/disconnect callbacks from runtime
//! tasks, never from the caller's stack.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use mockgps_core::prelude::*;

use crate::component::{BindFlags, ComponentName};
use crate::connection::{BindRegistration, ServiceConnection, ServiceHost};
use crate::location::LocationOverride;
use crate::service::{MockLocationBinder, MockLocationService};

/// Global registration ID counter
static REGISTRATION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

fn next_registration_id() -> u64 {
    REGISTRATION_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Tunables for the service manager
#[derive(Debug, Clone, Copy)]
pub struct ServiceManagerConfig {
    /// Delay before a connect callback is delivered
    pub connect_delay: Duration,
    /// Interval at which an active override is re-pushed
    pub update_interval: Duration,
}

impl Default for ServiceManagerConfig {
    fn default() -> Self {
        Self {
            connect_delay: Duration::ZERO,
            update_interval: Duration::from_secs(1),
        }
    }
}

/// One bind request
struct Registration {
    component: ComponentName,
    connection: Arc<dyn ServiceConnection>,
    connected: bool,
    /// Incremented on every delivered connect
    cycle: u64,
}

#[derive(Default)]
struct ManagerInner {
    /// Declared components and their running instance, if any
    services: HashMap<ComponentName, Option<Arc<MockLocationService>>>,
    registrations: HashMap<u64, Registration>,
}

impl ManagerInner {
    fn running(&self, component: &ComponentName) -> Option<Arc<MockLocationService>> {
        self.services.get(component).cloned().flatten()
    }
}

/// In-process service registry.
///
/// Cheap to clone; clones share the same registry.
pub struct ServiceManager<O> {
    inner: Arc<Mutex<ManagerInner>>,
    location_override: Arc<O>,
    config: ServiceManagerConfig,
}

impl<O> Clone for ServiceManager<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            location_override: Arc::clone(&self.location_override),
            config: self.config,
        }
    }
}

impl<O> ServiceManager<O>
where
    O: LocationOverride + Sync + 'static,
{
    pub fn new(location_override: Arc<O>, config: ServiceManagerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManagerInner::default())),
            location_override,
            config,
        }
    }

    /// Declare a component so it can be started and bound
    pub fn register(&self, component: ComponentName) {
        debug!("Registering service component {}", component);
        lock(&self.inner).services.entry(component).or_insert(None);
    }

    pub fn is_running(&self, component: &ComponentName) -> bool {
        lock(&self.inner).running(component).is_some()
    }

    /// Number of live bind registrations for `component`
    pub fn registration_count(&self, component: &ComponentName) -> usize {
        lock(&self.inner)
            .registrations
            .values()
            .filter(|r| &r.component == component)
            .count()
    }

    /// Simulate the service being reclaimed.
    ///
    /// The instance is destroyed and every connected registration receives
    /// `on_service_disconnected`. Registrations stay alive; a later `start`
    /// reconnects them. Returns false if the service was not running.
    pub fn kill(&self, component: &ComponentName) -> bool {
        let mut inner = lock(&self.inner);
        let ManagerInner {
            services,
            registrations,
        } = &mut *inner;

        let Some(service) = services.get_mut(component).and_then(Option::take) else {
            debug!("Kill requested for {} but it is not running", component);
            return false;
        };

        warn!("Service {} was killed", component);
        service.shutdown();

        let disconnected: Vec<(u64, u64)> = registrations
            .iter_mut()
            .filter(|(_, r)| &r.component == component && r.connected)
            .map(|(id, r)| {
                r.connected = false;
                (*id, r.cycle)
            })
            .collect();
        drop(inner);

        for (id, cycle) in disconnected {
            self.deliver_disconnect(id, cycle);
        }

        true
    }

    /// Destroy every running service and wait for their workers to finish
    pub async fn shutdown(&self) {
        let services: Vec<Arc<MockLocationService>> = {
            let mut inner = lock(&self.inner);
            inner.registrations.clear();
            inner
                .services
                .values_mut()
                .filter_map(Option::take)
                .collect()
        };

        for service in &services {
            service.shutdown();
        }
        for service in &services {
            service.join().await;
        }

        info!("Service manager shut down ({} service(s))", services.len());
    }

    /// Return the running instance, creating it if needed.
    fn ensure_running(
        &self,
        inner: &mut ManagerInner,
        component: &ComponentName,
    ) -> Result<(Arc<MockLocationService>, bool)> {
        let slot = inner
            .services
            .get_mut(component)
            .ok_or_else(|| Error::unknown_service(component.to_string()))?;

        if let Some(service) = slot {
            return Ok((Arc::clone(service), false));
        }

        let service = MockLocationService::create(
            component.clone(),
            Arc::clone(&self.location_override),
            self.config.update_interval,
        );
        *slot = Some(Arc::clone(&service));
        Ok((service, true))
    }

    /// Schedule the connect callback for a registration.
    ///
    /// Delivery re-checks the registration under the lock, so an `unbind`
    /// that lands first suppresses the callback.
    fn deliver_connect(&self, id: u64) {
        let inner = Arc::clone(&self.inner);
        let delay = self.config.connect_delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let mut guard = lock(&inner);
            let ManagerInner {
                services,
                registrations,
            } = &mut *guard;

            let Some(registration) = registrations.get_mut(&id) else {
                debug!("Registration {} released before connect", id);
                return;
            };
            if registration.connected {
                return;
            }
            let Some(service) = services.get(&registration.component).cloned().flatten() else {
                debug!("Registration {} waiting for its service to start", id);
                return;
            };

            registration.connected = true;
            registration.cycle += 1;
            debug!(
                "Delivering connect for registration {} to {}",
                id, registration.component
            );
            registration
                .connection
                .on_service_connected(&registration.component, MockLocationBinder::new(service));
        });
    }

    /// Schedule the disconnect callback for the connection `cycle` that
    /// `kill` tore down.
    ///
    /// A registration that reconnected before this task ran has moved on to
    /// a later cycle and must not see a disconnect for the old one.
    fn deliver_disconnect(&self, id: u64, cycle: u64) {
        let inner = Arc::clone(&self.inner);

        tokio::spawn(async move {
            let guard = lock(&inner);
            match guard.registrations.get(&id) {
                Some(registration) if registration.cycle != cycle => {
                    debug!(
                        "Registration {} reconnected before disconnect, skipping",
                        id
                    );
                }
                Some(registration) => {
                    debug!(
                        "Delivering disconnect for registration {} from {}",
                        id, registration.component
                    );
                    registration
                        .connection
                        .on_service_disconnected(&registration.component);
                }
                None => debug!("Registration {} released before disconnect", id),
            }
        });
    }
}

impl<O> ServiceHost for ServiceManager<O>
where
    O: LocationOverride + Sync + 'static,
{
    fn start(&self, component: &ComponentName) -> Result<()> {
        let pending: Vec<u64> = {
            let mut inner = lock(&self.inner);
            let (_, created) = self.ensure_running(&mut inner, component)?;
            if !created {
                debug!("Service {} already running", component);
                return Ok(());
            }

            inner
                .registrations
                .iter()
                .filter(|(_, r)| &r.component == component && !r.connected)
                .map(|(id, _)| *id)
                .collect()
        };

        info!("Started service {}", component);
        for id in pending {
            self.deliver_connect(id);
        }
        Ok(())
    }

    fn bind(
        &self,
        component: &ComponentName,
        connection: Arc<dyn ServiceConnection>,
        flags: BindFlags,
    ) -> Result<BindRegistration> {
        let mut inner = lock(&self.inner);

        let running = if flags.auto_create {
            self.ensure_running(&mut inner, component)?;
            true
        } else if inner.services.contains_key(component) {
            inner.running(component).is_some()
        } else {
            return Err(Error::unknown_service(component.to_string()));
        };

        let id = next_registration_id();
        inner.registrations.insert(
            id,
            Registration {
                component: component.clone(),
                connection,
                connected: false,
                cycle: 0,
            },
        );
        drop(inner);

        debug!(
            "Bind registration {} for {} (running: {})",
            id, component, running
        );
        if running {
            self.deliver_connect(id);
        }

        Ok(BindRegistration::new(id, component.clone()))
    }

    fn unbind(&self, registration: BindRegistration) -> Result<()> {
        let id = registration.id();
        let removed = lock(&self.inner).registrations.remove(&id);

        match removed {
            Some(_) => {
                debug!("Unbound registration {} from {}", id, registration.component());
                Ok(())
            }
            None => Err(Error::NotRegistered { id }),
        }
    }
}

fn lock(inner: &Mutex<ManagerInner>) -> MutexGuard<'_, ManagerInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}
