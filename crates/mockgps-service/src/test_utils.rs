//! Test utilities for service types
//!
//! Recording implementations of the override, observer and connection
//! traits, plus helpers for creating services outside a manager.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use mockgps_core::prelude::*;
use mockgps_core::LatLng;

use crate::component::ComponentName;
use crate::connection::ServiceConnection;
use crate::location::LocationOverride;
use crate::service::{MockLocationBinder, MockLocationService, MockObserver};

const WAIT_LIMIT: Duration = Duration::from_secs(30);

/// A call made on a [`RecordingOverride`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverrideCall {
    Set(LatLng),
    Clear,
}

/// Location override that records every call
#[derive(Debug, Default)]
pub struct RecordingOverride {
    calls: Mutex<Vec<OverrideCall>>,
    fail: AtomicBool,
    notify: Notify,
}

impl RecordingOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// An override whose every call fails
    pub fn failing() -> Self {
        let ov = Self::default();
        ov.fail.store(true, Ordering::SeqCst);
        ov
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<OverrideCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Wait until at least `count` calls were recorded
    pub async fn wait_for_calls(&self, count: usize) {
        self.wait_for(|calls| calls.len() >= count).await;
    }

    /// Wait until `pred` holds for the recorded calls
    pub async fn wait_for(&self, pred: impl Fn(&[OverrideCall]) -> bool) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if pred(&self.calls()) {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT_LIMIT, wait)
            .await
            .expect("override calls never matched");
    }

    fn record(&self, call: OverrideCall) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        self.notify.notify_waiters();

        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::location_override("test override failure"));
        }
        Ok(())
    }
}

impl LocationOverride for RecordingOverride {
    async fn set(&self, position: LatLng) -> Result<()> {
        self.record(OverrideCall::Set(position))
    }

    async fn clear(&self) -> Result<()> {
        self.record(OverrideCall::Clear)
    }
}

/// Observer that records every notification
#[derive(Debug, Default)]
pub struct RecordingObserver {
    changes: Mutex<Vec<bool>>,
    failures: Mutex<Vec<String>>,
    notify: Notify,
}

impl RecordingObserver {
    pub fn changes(&self) -> Vec<bool> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn wait_for_failure(&self) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if !self.failures().is_empty() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT_LIMIT, wait)
            .await
            .expect("no override failure reported");
    }
}

impl MockObserver for RecordingObserver {
    fn on_mocking_changed(&self, is_mocking: bool) {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(is_mocking);
        self.notify.notify_waiters();
    }

    fn on_override_failed(&self, error: &Error) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
        self.notify.notify_waiters();
    }
}

/// A callback received by a [`RecordingConnection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionCall {
    Connected(ComponentName),
    Disconnected(ComponentName),
}

/// Service connection that records callbacks and keeps the last binder
#[derive(Debug, Default)]
pub struct RecordingConnection {
    calls: Mutex<Vec<ConnectionCall>>,
    binder: Mutex<Option<MockLocationBinder>>,
    notify: Notify,
}

impl RecordingConnection {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ConnectionCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Service from the most recent connect callback
    pub fn service(&self) -> Option<Arc<MockLocationService>> {
        self.binder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(MockLocationBinder::get_service)
    }

    /// Wait until at least `count` callbacks were received
    pub async fn wait_for_calls(&self, count: usize) {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.calls().len() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(WAIT_LIMIT, wait)
            .await
            .expect("connection callbacks never arrived");
    }

    fn record(&self, call: ConnectionCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        self.notify.notify_waiters();
    }
}

impl ServiceConnection for RecordingConnection {
    fn on_service_connected(&self, name: &ComponentName, binder: MockLocationBinder) {
        *self.binder.lock().unwrap_or_else(PoisonError::into_inner) = Some(binder);
        self.record(ConnectionCall::Connected(name.clone()));
    }

    fn on_service_disconnected(&self, name: &ComponentName) {
        self.record(ConnectionCall::Disconnected(name.clone()));
    }
}

/// Create a standalone service backed by a [`RecordingOverride`].
///
/// Must be called from within a tokio runtime.
pub fn spawn_test_service() -> (Arc<MockLocationService>, Arc<RecordingOverride>) {
    let ov = Arc::new(RecordingOverride::new());
    let service = MockLocationService::create(
        ComponentName::mock_location_service(),
        Arc::clone(&ov),
        Duration::from_secs(1),
    );
    (service, ov)
}

/// Wrap a service in a binder, as a completed bind handshake would
pub fn test_binder(service: Arc<MockLocationService>) -> MockLocationBinder {
    MockLocationBinder::new(service)
}
