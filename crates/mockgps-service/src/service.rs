//! The mock location background service
//!
//! [`MockLocationService`] is the single source of truth for whether mocking
//! is active. It outlives any bound controller: a controller that unbinds
//! leaves the service (and an active override) running.
//!
//! The flag and target live in one `watch` value. A background worker owned by
//! the service observes it and drives the [`LocationOverride`]:
//! - mocking turned on: `set(target)`, then re-push every `update_interval`
//! - target changed while mocking: `set(new_target)` immediately
//! - mocking turned off, or service shut down: `clear()`

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use mockgps_core::prelude::*;
use mockgps_core::LatLng;

use crate::component::ComponentName;
use crate::location::LocationOverride;

/// Snapshot of the service's mutable state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockState {
    pub is_mocking: bool,
    pub target: LatLng,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            is_mocking: false,
            target: LatLng::default(),
        }
    }
}

/// Receives notifications from the service it is attached to.
///
/// The service holds only a weak reference; a dropped observer is skipped.
pub trait MockObserver: Send + Sync {
    fn on_mocking_changed(&self, is_mocking: bool);
    fn on_override_failed(&self, error: &Error);
}

/// Slot for the single attached observer
#[derive(Default)]
struct ObserverSlot {
    observer: Mutex<Option<Weak<dyn MockObserver>>>,
}

impl ObserverSlot {
    fn set(&self, observer: Option<Weak<dyn MockObserver>>) {
        *self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = observer;
    }

    fn get(&self) -> Option<Arc<dyn MockObserver>> {
        self.observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

/// Background service holding the mocking flag
pub struct MockLocationService {
    component: ComponentName,
    state_tx: watch::Sender<MockState>,
    observer: Arc<ObserverSlot>,
    shutdown_tx: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockLocationService {
    /// Create the service and spawn its override worker on the current runtime.
    pub(crate) fn create<O>(
        component: ComponentName,
        location_override: Arc<O>,
        update_interval: Duration,
    ) -> Arc<Self>
    where
        O: LocationOverride + Sync + 'static,
    {
        let (state_tx, state_rx) = watch::channel(MockState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let observer = Arc::new(ObserverSlot::default());

        info!("Creating service {}", component);

        let worker = tokio::spawn(run_override_worker(
            location_override,
            state_rx,
            shutdown_rx,
            Arc::clone(&observer),
            update_interval,
        ));

        Arc::new(Self {
            component,
            state_tx,
            observer,
            shutdown_tx,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn component(&self) -> &ComponentName {
        &self.component
    }

    /// Current value of the mocking flag
    pub fn is_mocking(&self) -> bool {
        self.state_tx.borrow().is_mocking
    }

    /// Flip the mocking flag and return the new value
    pub fn toggle_mocking(&self) -> bool {
        let mut is_mocking = false;
        self.state_tx.send_modify(|state| {
            state.is_mocking = !state.is_mocking;
            is_mocking = state.is_mocking;
        });

        info!(
            "Mocking {} at {}",
            if is_mocking { "started" } else { "stopped" },
            self.target()
        );

        if let Some(observer) = self.observer.get() {
            observer.on_mocking_changed(is_mocking);
        }

        is_mocking
    }

    /// Coordinate reported while mocking
    pub fn target(&self) -> LatLng {
        self.state_tx.borrow().target
    }

    /// Change the reported coordinate. Takes effect immediately while mocking.
    pub fn set_target(&self, target: LatLng) {
        self.state_tx.send_if_modified(|state| {
            if state.target == target {
                return false;
            }
            state.target = target;
            true
        });
    }

    /// Current state snapshot
    pub fn state(&self) -> MockState {
        *self.state_tx.borrow()
    }

    /// Attach the bound controller, replacing any previous one
    pub fn attach_observer(&self, observer: Weak<dyn MockObserver>) {
        debug!("Observer attached to {}", self.component);
        self.observer.set(Some(observer));
    }

    /// Forget the bound controller
    pub fn detach_observer(&self) {
        debug!("Observer detached from {}", self.component);
        self.observer.set(None);
    }

    pub fn has_observer(&self) -> bool {
        self.observer.get().is_some()
    }

    /// Signal the worker to clear the override and exit. Does not wait.
    pub(crate) fn shutdown(&self) {
        info!("Destroying service {}", self.component);
        self.observer.set(None);
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for the worker to finish after [`shutdown`](Self::shutdown)
    pub(crate) async fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Override worker for {} panicked: {}", self.component, e);
            }
        }
    }
}

impl std::fmt::Debug for MockLocationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLocationService")
            .field("component", &self.component)
            .field("state", &self.state())
            .finish()
    }
}

/// Token delivered by a completed bind handshake
#[derive(Clone)]
pub struct MockLocationBinder {
    service: Arc<MockLocationService>,
}

impl MockLocationBinder {
    pub(crate) fn new(service: Arc<MockLocationService>) -> Self {
        Self { service }
    }

    /// Live reference to the bound service
    pub fn get_service(&self) -> Arc<MockLocationService> {
        Arc::clone(&self.service)
    }
}

impl std::fmt::Debug for MockLocationBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MockLocationBinder")
            .field(&self.service.component)
            .finish()
    }
}

/// Background task: mirrors the mocking state onto the location override.
///
/// Exits when the shutdown flag is raised or the service is dropped, clearing
/// the override if it was engaged.
async fn run_override_worker<O>(
    location_override: Arc<O>,
    mut state_rx: watch::Receiver<MockState>,
    mut shutdown_rx: watch::Receiver<bool>,
    observer: Arc<ObserverSlot>,
    update_interval: Duration,
) where
    O: LocationOverride + Sync + 'static,
{
    let mut engaged = false;
    let mut ticker = tokio::time::interval(update_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let report = |e: Error| {
        warn!("Location override error: {}", e);
        if let Some(observer) = observer.get() {
            observer.on_override_failed(&e);
        }
    };

    loop {
        tokio::select! {
            changed = state_rx.changed() => {
                if changed.is_err() {
                    debug!("Service dropped, stopping override worker");
                    break;
                }
                let state = *state_rx.borrow_and_update();

                if state.is_mocking {
                    if let Err(e) = location_override.set(state.target).await {
                        report(e);
                    }
                    if !engaged {
                        engaged = true;
                        ticker.reset();
                    }
                } else if engaged {
                    engaged = false;
                    if let Err(e) = location_override.clear().await {
                        report(e);
                    }
                }
            }
            _ = ticker.tick(), if engaged => {
                let target = state_rx.borrow().target;
                trace!("Re-pushing override position {}", target);
                if let Err(e) = location_override.set(target).await {
                    report(e);
                }
            }
            _ = shutdown_rx.changed() => {
                debug!("Shutdown signal received by override worker");
                break;
            }
        }
    }

    if engaged {
        if let Err(e) = location_override.clear().await {
            warn!("Failed to clear override on shutdown: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{spawn_test_service, RecordingOverride, OverrideCall};

    fn jakarta() -> LatLng {
        LatLng::default()
    }

    #[tokio::test]
    async fn test_service_starts_idle() {
        let (service, _ov) = spawn_test_service();
        assert!(!service.is_mocking());
        assert_eq!(service.target(), jakarta());
    }

    #[tokio::test]
    async fn test_toggle_is_a_pure_flip() {
        let (service, _ov) = spawn_test_service();
        assert!(service.toggle_mocking());
        assert!(service.is_mocking());
        assert!(!service.toggle_mocking());
        assert!(!service.is_mocking());
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_sets_and_clears_override() {
        let (service, ov) = spawn_test_service();

        service.toggle_mocking();
        ov.wait_for_calls(1).await;
        assert_eq!(ov.calls()[0], OverrideCall::Set(jakarta()));

        service.toggle_mocking();
        ov.wait_for(|calls| calls.last() == Some(&OverrideCall::Clear))
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_repushes_on_interval() {
        let (service, ov) = spawn_test_service();
        service.toggle_mocking();
        ov.wait_for_calls(1).await;

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let sets = ov
            .calls()
            .iter()
            .filter(|c| matches!(c, OverrideCall::Set(_)))
            .count();
        assert!(sets >= 3, "expected periodic re-push, got {} sets", sets);
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_change_pushed_while_mocking() {
        let (service, ov) = spawn_test_service();
        service.toggle_mocking();
        ov.wait_for_calls(1).await;

        let paris = LatLng::new(48.8566, 2.3522).unwrap();
        service.set_target(paris);

        ov.wait_for(|calls| calls.contains(&OverrideCall::Set(paris)))
            .await;
        assert_eq!(service.target(), paris);
    }

    #[tokio::test(start_paused = true)]
    async fn test_target_change_while_idle_does_not_engage() {
        let (service, ov) = spawn_test_service();
        service.set_target(LatLng::new(1.0, 1.0).unwrap());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(ov.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_clears_engaged_override() {
        let (service, ov) = spawn_test_service();
        service.toggle_mocking();
        ov.wait_for_calls(1).await;

        service.shutdown();
        service.join().await;

        assert_eq!(ov.calls().last(), Some(&OverrideCall::Clear));
    }

    #[tokio::test(start_paused = true)]
    async fn test_override_failure_reported_without_changing_flag() {
        let ov = Arc::new(RecordingOverride::failing());
        let service = MockLocationService::create(
            ComponentName::mock_location_service(),
            Arc::clone(&ov),
            Duration::from_secs(1),
        );
        let observer = Arc::new(crate::test_utils::RecordingObserver::default());
        let weak: Weak<dyn MockObserver> = Arc::downgrade(&observer) as Weak<dyn MockObserver>;
        service.attach_observer(weak);

        service.toggle_mocking();
        observer.wait_for_failure().await;

        assert!(service.is_mocking());
        assert_eq!(observer.changes(), vec![true]);
    }

    #[tokio::test]
    async fn test_observer_detach_and_drop() {
        let (service, _ov) = spawn_test_service();
        let observer = Arc::new(crate::test_utils::RecordingObserver::default());
        let weak: Weak<dyn MockObserver> = Arc::downgrade(&observer) as Weak<dyn MockObserver>;

        service.attach_observer(weak);
        assert!(service.has_observer());

        service.detach_observer();
        assert!(!service.has_observer());
        service.toggle_mocking();
        assert!(observer.changes().is_empty());

        let weak: Weak<dyn MockObserver> = Arc::downgrade(&observer) as Weak<dyn MockObserver>;
        service.attach_observer(weak);
        drop(observer);
        assert!(!service.has_observer());
        // Dropped observer is skipped silently
        service.toggle_mocking();
    }
}
