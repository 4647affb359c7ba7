//! Test doubles for platform collaborators and a controller harness

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;

use mockgps_core::{CameraTarget, MapType, ServiceEvent};
use mockgps_service::test_utils::RecordingOverride;
use mockgps_service::{ComponentName, MockLocationService, ServiceManager, ServiceManagerConfig};

use crate::config::Settings;
use crate::controller::HostController;
use crate::message::Message;
use crate::platform::{Haptics, MapSurface, Notifier, PermissionChecker, Platform};

mockall::mock! {
    pub Vibrator {}
    impl Haptics for Vibrator {
        fn vibrate(&self);
    }
}

/// Haptics double that accepts any number of pulses
pub fn quiet_haptics() -> MockVibrator {
    let mut haptics = MockVibrator::new();
    haptics.expect_vibrate().return_const(());
    haptics
}

#[derive(Debug)]
pub struct FakePermissions {
    granted: AtomicBool,
}

impl FakePermissions {
    pub fn new(granted: bool) -> Self {
        Self {
            granted: AtomicBool::new(granted),
        }
    }

    pub fn set(&self, granted: bool) {
        self.granted.store(granted, Ordering::SeqCst);
    }
}

impl PermissionChecker for FakePermissions {
    fn has_location_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn show_toast(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

#[derive(Debug, Default)]
pub struct RecordingMapSurface {
    map_types: Mutex<Vec<MapType>>,
    cameras: Mutex<Vec<CameraTarget>>,
}

impl RecordingMapSurface {
    pub fn map_types(&self) -> Vec<MapType> {
        self.map_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn cameras(&self) -> Vec<CameraTarget> {
        self.cameras
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl MapSurface for RecordingMapSurface {
    fn set_map_type(&self, map_type: MapType) {
        self.map_types
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(map_type);
    }

    fn move_camera(&self, camera: CameraTarget) {
        self.cameras
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(camera);
    }
}

/// A controller wired to a real service manager and recording doubles
pub struct TestHarness {
    pub controller: HostController,
    pub manager: ServiceManager<RecordingOverride>,
    pub location_override: Arc<RecordingOverride>,
    pub permissions: Arc<FakePermissions>,
    pub notifier: Arc<RecordingNotifier>,
    pub map_surface: Arc<RecordingMapSurface>,
    pub platform: Platform,
    pub msg_tx: mpsc::Sender<Message>,
    pub msg_rx: mpsc::Receiver<Message>,
}

impl TestHarness {
    pub fn build(
        permitted: bool,
        haptics: MockVibrator,
        connect_delay: Duration,
        settings: &Settings,
    ) -> Self {
        let location_override = Arc::new(RecordingOverride::new());
        let manager = ServiceManager::new(
            Arc::clone(&location_override),
            ServiceManagerConfig {
                connect_delay,
                ..Default::default()
            },
        );
        manager.register(ComponentName::mock_location_service());

        let permissions = Arc::new(FakePermissions::new(permitted));
        let notifier = Arc::new(RecordingNotifier::default());
        let map_surface = Arc::new(RecordingMapSurface::default());

        let platform = Platform {
            host: Arc::new(manager.clone()),
            permissions: permissions.clone(),
            haptics: Arc::new(haptics),
            notifier: notifier.clone(),
            map_surface: map_surface.clone(),
        };

        let (msg_tx, msg_rx) = mpsc::channel(64);
        let controller = HostController::new(
            ComponentName::mock_location_service(),
            platform.clone(),
            msg_tx.clone(),
            settings,
        );

        Self {
            controller,
            manager,
            location_override,
            permissions,
            notifier,
            map_surface,
            platform,
            msg_tx,
            msg_rx,
        }
    }

    /// Second controller sharing this harness's platform
    pub fn sibling_controller(&self) -> HostController {
        self.controller_for(ComponentName::mock_location_service())
    }

    pub fn controller_for(&self, component: ComponentName) -> HostController {
        HostController::new(
            component,
            self.platform.clone(),
            self.msg_tx.clone(),
            &Settings::default(),
        )
    }

    pub fn service(&self) -> Option<Arc<MockLocationService>> {
        self.controller.binding().service().cloned()
    }

    pub async fn wait_bound(&self) {
        wait_until(|| self.controller.is_bound()).await;
    }

    pub async fn wait_unbound(&self) {
        wait_until(|| !self.controller.is_bound()).await;
    }

    pub async fn wait_for_bound(&self, controller: &HostController) {
        wait_until(|| controller.is_bound()).await;
    }

    /// Next service event posted to the engine channel
    pub async fn next_service_event(&mut self) -> ServiceEvent {
        loop {
            match self.msg_rx.recv().await {
                Some(Message::Service(event)) => return event,
                Some(_) => continue,
                None => panic!("message channel closed"),
            }
        }
    }
}

/// Harness with permissive haptics and an immediate connect
pub fn harness(permitted: bool) -> TestHarness {
    harness_with(permitted, quiet_haptics(), Duration::ZERO)
}

pub fn harness_with(permitted: bool, haptics: MockVibrator, connect_delay: Duration) -> TestHarness {
    TestHarness::build(permitted, haptics, connect_delay, &Settings::default())
}

/// Poll `cond` until it holds, yielding to runtime tasks in between
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    let wait = async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(30), wait)
        .await
        .expect("condition never became true");
}
