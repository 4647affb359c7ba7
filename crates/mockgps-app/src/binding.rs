//! Binding between a host controller and the mock service
//!
//! [`ServiceBinding`] carries the service handle only in its `Bound` variant,
//! so "bound without a handle" cannot be represented. [`BindingSlot`] owns the
//! current value and swaps it whole under one lock: the connect and disconnect
//! callbacks run on runtime tasks and a concurrent reader sees either the old
//! or the new binding, never a mix.

use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use mockgps_core::prelude::*;
use mockgps_core::ServiceEvent;
use mockgps_service::{
    ComponentName, MockLocationBinder, MockLocationService, MockObserver, ServiceConnection,
};

use crate::message::Message;

/// Connection state as seen by the controller
#[derive(Debug, Clone, Default)]
pub enum ServiceBinding {
    /// No bind request outstanding
    #[default]
    Unbound,
    /// Bind request sent, waiting for the connect callback
    Binding { requested_at: Instant },
    /// Handshake completed
    Bound { service: Arc<MockLocationService> },
}

impl ServiceBinding {
    pub fn is_bound(&self) -> bool {
        matches!(self, ServiceBinding::Bound { .. })
    }

    pub fn service(&self) -> Option<&Arc<MockLocationService>> {
        match self {
            ServiceBinding::Bound { service } => Some(service),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ServiceBinding::Unbound => "unbound",
            ServiceBinding::Binding { .. } => "binding",
            ServiceBinding::Bound { .. } => "bound",
        }
    }
}

/// Shared holder of the current [`ServiceBinding`].
///
/// Handed to the service host as the connection for a bind request, and to
/// the bound service as its observer. Both roles forward what they learn to
/// the engine as [`Message::Service`].
pub struct BindingSlot {
    binding: RwLock<ServiceBinding>,
    msg_tx: mpsc::Sender<Message>,
    me: Weak<BindingSlot>,
}

impl BindingSlot {
    pub fn new(msg_tx: mpsc::Sender<Message>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            binding: RwLock::new(ServiceBinding::Unbound),
            msg_tx,
            me: me.clone(),
        })
    }

    /// Copy of the current binding
    pub fn snapshot(&self) -> ServiceBinding {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Handle to the bound service, if bound
    pub fn service(&self) -> Option<Arc<MockLocationService>> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .service()
            .cloned()
    }

    pub fn is_bound(&self) -> bool {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_bound()
    }

    pub fn is_binding(&self) -> bool {
        matches!(
            *self.binding.read().unwrap_or_else(PoisonError::into_inner),
            ServiceBinding::Binding { .. }
        )
    }

    /// Record that a bind request was issued
    pub(crate) fn mark_binding(&self) {
        self.replace(ServiceBinding::Binding {
            requested_at: Instant::now(),
        });
    }

    /// Return to `Unbound`, detaching from the service if bound
    pub(crate) fn clear(&self) {
        if let ServiceBinding::Bound { service } = self.replace(ServiceBinding::Unbound) {
            service.detach_observer();
        }
    }

    fn replace(&self, binding: ServiceBinding) -> ServiceBinding {
        let mut guard = self.binding.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Binding {} -> {}", guard.label(), binding.label());
        std::mem::replace(&mut *guard, binding)
    }

    /// Queue `event` for the engine without blocking the calling task
    fn post(&self, event: ServiceEvent) -> Result<()> {
        self.msg_tx
            .try_send(Message::Service(event))
            .map_err(|e| match e {
                TrySendError::Full(msg) => {
                    Error::channel_send(format!("engine queue full, dropped {:?}", msg))
                }
                TrySendError::Closed(_) => Error::ChannelClosed,
            })
    }

    fn forward(&self, event: ServiceEvent) {
        if let Err(e) = self.post(event) {
            warn!("Dropping service event: {}", e);
        }
    }
}

impl ServiceConnection for BindingSlot {
    fn on_service_connected(&self, name: &ComponentName, binder: MockLocationBinder) {
        let service = binder.get_service();
        let observer: Weak<dyn MockObserver> = self.me.clone();
        service.attach_observer(observer);

        match self.replace(ServiceBinding::Bound { service }) {
            ServiceBinding::Binding { requested_at } => {
                info!("Bound to {} after {:?}", name, requested_at.elapsed())
            }
            _ => info!("Bound to {}", name),
        }

        self.forward(ServiceEvent::Connected {
            component: name.to_string(),
        });
    }

    fn on_service_disconnected(&self, name: &ComponentName) {
        warn!("Service {} disconnected", name);
        self.replace(ServiceBinding::Unbound);
        self.forward(ServiceEvent::Disconnected {
            component: name.to_string(),
        });
    }
}

impl MockObserver for BindingSlot {
    fn on_mocking_changed(&self, is_mocking: bool) {
        self.forward(ServiceEvent::MockingChanged { is_mocking });
    }

    fn on_override_failed(&self, error: &Error) {
        self.forward(ServiceEvent::OverrideFailed {
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockgps_service::test_utils::{spawn_test_service, test_binder};

    fn slot() -> (Arc<BindingSlot>, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(16);
        (BindingSlot::new(tx), rx)
    }

    #[test]
    fn test_new_slot_is_unbound() {
        let (slot, _rx) = slot();
        assert!(matches!(slot.snapshot(), ServiceBinding::Unbound));
        assert!(!slot.is_bound());
        assert!(slot.service().is_none());
    }

    #[test]
    fn test_binding_is_not_bound() {
        let (slot, _rx) = slot();
        slot.mark_binding();
        assert!(slot.is_binding());
        assert!(!slot.is_bound());
        assert!(slot.service().is_none());
    }

    #[tokio::test]
    async fn test_connect_sets_handle_and_observer() {
        let (slot, mut rx) = slot();
        let (service, _ov) = spawn_test_service();
        slot.mark_binding();

        slot.on_service_connected(
            &ComponentName::mock_location_service(),
            test_binder(Arc::clone(&service)),
        );

        assert!(slot.is_bound());
        assert!(Arc::ptr_eq(&slot.service().unwrap(), &service));
        assert!(service.has_observer());
        assert!(matches!(
            rx.recv().await,
            Some(Message::Service(ServiceEvent::Connected { .. }))
        ));
    }

    #[tokio::test]
    async fn test_observer_forwards_mocking_changes() {
        let (slot, mut rx) = slot();
        let (service, _ov) = spawn_test_service();
        slot.on_service_connected(
            &ComponentName::mock_location_service(),
            test_binder(Arc::clone(&service)),
        );
        let _connected = rx.recv().await;

        service.toggle_mocking();
        assert_eq!(
            rx.recv().await,
            Some(Message::Service(ServiceEvent::MockingChanged {
                is_mocking: true
            }))
        );
    }

    #[tokio::test]
    async fn test_disconnect_clears_handle() {
        let (slot, mut rx) = slot();
        let (service, _ov) = spawn_test_service();
        let name = ComponentName::mock_location_service();
        slot.on_service_connected(&name, test_binder(service));
        let _connected = rx.recv().await;

        slot.on_service_disconnected(&name);

        assert!(matches!(slot.snapshot(), ServiceBinding::Unbound));
        assert!(matches!(
            rx.recv().await,
            Some(Message::Service(ServiceEvent::Disconnected { .. }))
        ));
    }

    #[tokio::test]
    async fn test_clear_detaches_observer() {
        let (slot, _rx) = slot();
        let (service, _ov) = spawn_test_service();
        slot.on_service_connected(
            &ComponentName::mock_location_service(),
            test_binder(Arc::clone(&service)),
        );
        assert!(service.has_observer());

        slot.clear();

        assert!(!slot.is_bound());
        assert!(!service.has_observer());
    }

    #[tokio::test]
    async fn test_full_channel_drops_event() {
        let (tx, mut rx) = mpsc::channel(1);
        let slot = BindingSlot::new(tx);
        slot.on_mocking_changed(true);
        // Overflow is dropped without panicking
        slot.on_mocking_changed(false);

        assert!(matches!(
            slot.post(ServiceEvent::MockingChanged { is_mocking: false }),
            Err(Error::ChannelSend { .. })
        ));
        assert_eq!(
            rx.recv().await,
            Some(Message::Service(ServiceEvent::MockingChanged {
                is_mocking: true
            }))
        );
    }

    #[test]
    fn test_post_after_engine_gone_reports_closed() {
        let (slot, rx) = slot();
        drop(rx);

        let err = slot
            .post(ServiceEvent::MockingChanged { is_mocking: true })
            .unwrap_err();
        assert!(matches!(err, Error::ChannelClosed));
        assert!(err.is_fatal());
    }
}
