//! Engine - orchestration shared by every frontend
//!
//! The Engine owns the host controller, the message channel that feeds it and
//! the broadcast channel that reports what happened. Frontends push
//! [`Message`]s through `msg_sender()` and drain `msg_rx` in their own loop.

use tokio::sync::{broadcast, mpsc};

use mockgps_core::prelude::*;
use mockgps_service::ComponentName;

use crate::config::Settings;
use crate::controller::HostController;
use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::platform::Platform;

/// Orchestration engine for Mock GPS.
pub struct Engine {
    controller: HostController,

    /// Sender half of the message channel.
    /// Clone this to give to input sources (stdin reader, timers, the binding).
    pub msg_tx: mpsc::Sender<Message>,

    /// Receiver half of the message channel.
    /// The frontend event loop drains messages from here.
    pub msg_rx: mpsc::Receiver<Message>,

    /// Loaded settings
    pub settings: Settings,

    event_tx: broadcast::Sender<EngineEvent>,

    should_quit: bool,
}

impl Engine {
    /// Create an engine for `component`. Nothing is started until [`Engine::start`].
    pub fn new(settings: Settings, component: ComponentName, platform: Platform) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<Message>(256);
        let (event_tx, _) = broadcast::channel(256);

        let controller = HostController::new(component, platform, msg_tx.clone(), &settings);

        Self {
            controller,
            msg_tx,
            msg_rx,
            settings,
            event_tx,
            should_quit: false,
        }
    }

    /// Create the screen: render the map, start and bind the service
    pub fn start(&mut self) -> Result<()> {
        let attempt = self.controller.on_create()?;
        self.arm_bind_timeout(attempt);
        Ok(())
    }

    /// Subscribe to engine events.
    ///
    /// Slow subscribers lose the oldest events (`RecvError::Lagged`).
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    pub fn process_message(&mut self, msg: Message) {
        trace!("Processing {:?}", msg);

        match msg {
            Message::ToggleMocking => {
                let outcome = self.controller.toggle();
                self.emit(EngineEvent::Toggled { outcome });
            }
            Message::SelectMapType(map_type) => self.controller.select_map_type(map_type),
            Message::SelectLocation(position) => self.controller.select_location(position),
            Message::Service(event) => {
                self.controller.handle_service_event(&event);
                self.emit(EngineEvent::Service(event));
            }
            Message::BindTimedOut { attempt } => {
                if self.controller.handle_bind_timeout(attempt) {
                    self.emit(EngineEvent::BindTimedOut { attempt });
                }
            }
            Message::RetryBind => match self.controller.retry_bind() {
                Ok(attempt) => self.arm_bind_timeout(attempt),
                Err(e) => {
                    error!("Retrying bind failed: {}", e);
                    self.emit(EngineEvent::BindFailed {
                        message: e.to_string(),
                    });
                }
            },
            Message::Quit => self.should_quit = true,
        }
    }

    /// Process everything already queued. Returns the number of messages handled.
    pub fn drain_pending_messages(&mut self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.process_message(msg);
            count += 1;
        }
        count
    }

    pub fn msg_sender(&self) -> mpsc::Sender<Message> {
        self.msg_tx.clone()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn controller(&self) -> &HostController {
        &self.controller
    }

    /// Destroy the screen. The service keeps running.
    pub fn shutdown(&mut self) {
        self.emit(EngineEvent::Shutdown);
        self.controller.on_destroy();
    }

    /// Post `BindTimedOut { attempt }` once the configured timeout elapses
    fn arm_bind_timeout(&self, attempt: u64) {
        let Some(timeout) = self.settings.service.bind_timeout() else {
            return;
        };

        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            // Receiver gone means the engine already shut down
            let _ = msg_tx.send(Message::BindTimedOut { attempt }).await;
        });
    }

    fn emit(&self, event: EngineEvent) {
        debug!("Engine event: {}", event.event_type());
        // Err only means nobody is subscribed
        let _ = self.event_tx.send(event);
    }
}
