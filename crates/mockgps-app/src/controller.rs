//! Host controller - the foreground screen's side of the mock toggle
//!
//! The controller never stores the mocking flag. It starts and binds the
//! mock service, and on every toggle request asks the bound service to flip
//! its flag and reads the result back.
//!
//! Toggle preconditions are checked in a fixed order because the order picks
//! the message shown to the user:
//! 1. bound and permitted: flip the service flag
//! 2. permitted but not bound: "Service not bound"
//! 3. otherwise: "No Location permission"

use std::sync::Arc;

use tokio::sync::mpsc;

use mockgps_core::prelude::*;
use mockgps_core::{LatLng, MapType, ServiceEvent, ToggleOutcome};
use mockgps_service::{BindFlags, BindRegistration, ComponentName, ServiceConnection};

use crate::binding::{BindingSlot, ServiceBinding};
use crate::config::Settings;
use crate::map::MapScreen;
use crate::message::Message;
use crate::platform::Platform;

pub struct HostController {
    component: ComponentName,
    platform: Platform,
    slot: Arc<BindingSlot>,
    /// Held from a successful `bind` until it is released exactly once
    registration: Option<BindRegistration>,
    /// Incremented per bind request so stale timeouts can be ignored
    bind_attempt: u64,
    map: MapScreen,
    /// Target picked while unbound, pushed on the next connect. Starts as
    /// the configured camera position so the mock matches the map.
    pending_target: Option<LatLng>,
    haptics_enabled: bool,
}

impl HostController {
    pub fn new(
        component: ComponentName,
        platform: Platform,
        msg_tx: mpsc::Sender<Message>,
        settings: &Settings,
    ) -> Self {
        let camera = settings.map.camera();
        Self {
            component,
            platform,
            slot: BindingSlot::new(msg_tx),
            registration: None,
            bind_attempt: 0,
            map: MapScreen::new(settings.map.map_type, camera),
            pending_target: Some(camera.position),
            haptics_enabled: settings.feedback.haptics,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────

    /// Render the screen, start the service and request a bind.
    ///
    /// Returns the bind attempt number for timeout tracking. The bind
    /// completes later through the connect callback.
    pub fn on_create(&mut self) -> Result<u64> {
        info!("Host controller created for {}", self.component);
        self.map.render(self.platform.map_surface.as_ref());
        self.bind()
    }

    /// Release the bind registration if one is held. The service keeps running.
    pub fn on_destroy(&mut self) {
        if self.release_registration() {
            info!("Host controller destroyed, unbound from {}", self.component);
        } else {
            debug!("Host controller destroyed while not bound");
        }
    }

    /// Drop any outstanding bind and issue a new one
    pub fn retry_bind(&mut self) -> Result<u64> {
        if self.slot.is_bound() {
            debug!("Retry requested while bound, nothing to do");
            return Ok(self.bind_attempt);
        }
        self.bind()
    }

    /// Give up on bind `attempt` if it is still pending.
    ///
    /// Returns true if the timeout took effect.
    pub fn handle_bind_timeout(&mut self, attempt: u64) -> bool {
        if attempt != self.bind_attempt || !self.slot.is_binding() {
            return false;
        }

        warn!(
            "Bind to {} did not complete, releasing attempt {}",
            self.component, attempt
        );
        self.release_registration();
        true
    }

    fn bind(&mut self) -> Result<u64> {
        // One registration per controller
        if self.release_registration() {
            debug!("Released previous registration before rebinding");
        }
        self.platform.host.start(&self.component)?;

        // Mark before binding: the connect callback may land right after `bind`
        self.slot.mark_binding();
        let connection: Arc<dyn ServiceConnection> = self.slot.clone();
        match self
            .platform
            .host
            .bind(&self.component, connection, BindFlags::AUTO_CREATE)
        {
            Ok(registration) => {
                self.registration = Some(registration);
                self.bind_attempt += 1;
                debug!("Bind attempt {} issued", self.bind_attempt);
                Ok(self.bind_attempt)
            }
            Err(e) => {
                self.slot.clear();
                Err(e)
            }
        }
    }

    /// Unbind and clear the binding. Returns false if nothing was held.
    fn release_registration(&mut self) -> bool {
        let Some(registration) = self.registration.take() else {
            self.slot.clear();
            return false;
        };

        if let Err(e) = self.platform.host.unbind(registration) {
            warn!("Unbind from {} failed: {}", self.component, e);
        }
        self.slot.clear();
        true
    }

    // ─────────────────────────────────────────────────────────
    // Toggle
    // ─────────────────────────────────────────────────────────

    /// Toggle mocking. Returns true only if the service is now mocking.
    pub fn toggle_mocking(&self) -> bool {
        self.toggle().is_mocking()
    }

    /// Toggle mocking and report which of the four outcomes occurred.
    ///
    /// Every outcome shows its notification; only a flip vibrates.
    pub fn toggle(&self) -> ToggleOutcome {
        let permitted = self.platform.permissions.has_location_permission();

        let outcome = match (self.slot.service(), permitted) {
            (Some(service), true) => {
                if service.toggle_mocking() {
                    ToggleOutcome::Started
                } else {
                    ToggleOutcome::Stopped
                }
            }
            (None, true) => ToggleOutcome::NotBound,
            (_, false) => ToggleOutcome::PermissionDenied,
        };

        info!("Toggle: {:?}", outcome);
        self.platform.notifier.show_toast(outcome.message());
        if outcome.vibrates() && self.haptics_enabled {
            self.platform.haptics.vibrate();
        }

        outcome
    }

    // ─────────────────────────────────────────────────────────
    // Map
    // ─────────────────────────────────────────────────────────

    pub fn select_map_type(&mut self, map_type: MapType) {
        if self
            .map
            .select_map_type(map_type, self.platform.map_surface.as_ref())
        {
            debug!("Map type changed to {}", map_type);
        }
    }

    /// Center the map on `position` and make it the mocked coordinate
    pub fn select_location(&mut self, position: LatLng) {
        self.map
            .move_to(position, self.platform.map_surface.as_ref());

        match self.slot.service() {
            Some(service) => {
                service.set_target(position);
                self.pending_target = None;
            }
            None => self.pending_target = Some(position),
        }
        info!("Mock target set to {}", position);
    }

    // ─────────────────────────────────────────────────────────
    // Service events
    // ─────────────────────────────────────────────────────────

    /// React to a forwarded service event
    pub fn handle_service_event(&mut self, event: &ServiceEvent) {
        debug!("Service event: {}", event.summary());

        if let ServiceEvent::Connected { .. } = event {
            if let (Some(target), Some(service)) = (self.pending_target, self.slot.service()) {
                service.set_target(target);
                self.pending_target = None;
                debug!("Pushed pending target {}", target);
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn binding(&self) -> ServiceBinding {
        self.slot.snapshot()
    }

    pub fn is_bound(&self) -> bool {
        self.slot.is_bound()
    }

    /// Mocking flag of the bound service, `None` when not bound
    pub fn is_mocking(&self) -> Option<bool> {
        self.slot.service().map(|s| s.is_mocking())
    }

    pub fn has_registration(&self) -> bool {
        self.registration.is_some()
    }

    pub fn bind_attempt(&self) -> u64 {
        self.bind_attempt
    }

    pub fn map(&self) -> &MapScreen {
        &self.map
    }

    pub fn component(&self) -> &ComponentName {
        &self.component
    }
}
