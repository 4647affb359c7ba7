//! Headless mode runner - main event loop
//!
//! Wires the engine to an in-process service manager and the console
//! collaborators, reads commands from stdin and writes NDJSON events.

use std::path::Path;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{broadcast, mpsc};

use mockgps_app::{config, signals, Engine, EngineEvent, Message, Platform};
use mockgps_core::prelude::*;
use mockgps_core::{LatLng, MapType, ServiceEvent};
use mockgps_service::{ComponentName, ServiceManager, TracingOverride};

use super::console::{ConsoleHaptics, ConsoleMapSurface, ConsoleNotifier, StaticPermissions};
use super::HeadlessEvent;

/// Command-line overrides for a headless run
#[derive(Debug, Clone, Default)]
pub struct HeadlessOptions {
    /// Answer "no" to every location permission check
    pub deny_permission: bool,
    /// Override `service.connect_delay_ms` from the config file
    pub connect_delay_ms: Option<u64>,
}

/// A parsed stdin line
#[derive(Debug, Clone, PartialEq)]
pub enum StdinCommand {
    /// Forward to the engine
    Send(Message),
    /// Reclaim the service process
    Kill,
}

/// Run in headless mode until `quit`, end of input or a termination signal
pub async fn run_headless(project_path: &Path, options: HeadlessOptions) -> Result<()> {
    info!("═══════════════════════════════════════════════════════");
    info!("Mock GPS starting in HEADLESS mode");
    info!("Project: {}", project_path.display());
    info!("═══════════════════════════════════════════════════════");

    let mut settings = config::load_settings(project_path);
    if let Some(delay) = options.connect_delay_ms {
        settings.service.connect_delay_ms = delay;
    }

    let component = ComponentName::mock_location_service();
    let manager = ServiceManager::new(
        Arc::new(TracingOverride::new()),
        settings.service.manager_config(),
    );
    manager.register(component.clone());

    let platform = Platform {
        host: Arc::new(manager.clone()),
        permissions: Arc::new(StaticPermissions::new(!options.deny_permission)),
        haptics: Arc::new(ConsoleHaptics),
        notifier: Arc::new(ConsoleNotifier),
        map_surface: Arc::new(ConsoleMapSurface),
    };

    let mut engine = Engine::new(settings, component.clone(), platform);
    let mut events = engine.subscribe();

    let signal_task = signals::spawn_signal_handler(engine.msg_sender());

    let stdin_tx = engine.msg_sender();
    let stdin_manager = manager.clone();
    let runtime = Handle::current();
    std::thread::spawn(move || {
        spawn_stdin_reader_blocking(stdin_tx, stdin_manager, component, runtime);
    });

    let result = match engine.start() {
        Ok(()) => headless_event_loop(&mut engine, &mut events).await,
        Err(e) => {
            error!("Failed to start: {}", e);
            HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
            Err(e)
        }
    };

    signal_task.abort();
    engine.shutdown();
    flush_engine_events(&mut events);
    manager.shutdown().await;

    info!("Mock GPS headless mode exiting");
    result
}

async fn headless_event_loop(
    engine: &mut Engine,
    events: &mut broadcast::Receiver<EngineEvent>,
) -> Result<()> {
    loop {
        if engine.should_quit() {
            info!("Quit requested");
            break;
        }

        match engine.msg_rx.recv().await {
            Some(msg) => {
                engine.process_message(msg);
                flush_engine_events(events);
            }
            None => {
                info!("Message channel closed");
                break;
            }
        }
    }

    Ok(())
}

/// Write every engine event broadcast so far to stdout
fn flush_engine_events(events: &mut broadcast::Receiver<EngineEvent>) {
    loop {
        match events.try_recv() {
            Ok(event) => emit_engine_event(&event),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!("Headless output skipped {} engine events", skipped);
            }
            Err(_) => break,
        }
    }
}

fn emit_engine_event(event: &EngineEvent) {
    let headless = match event {
        EngineEvent::Toggled { outcome } => HeadlessEvent::toggled(*outcome),
        EngineEvent::Service(ServiceEvent::Connected { component }) => {
            HeadlessEvent::bound(component)
        }
        EngineEvent::Service(ServiceEvent::Disconnected { component }) => {
            HeadlessEvent::unbound(component)
        }
        EngineEvent::Service(ServiceEvent::MockingChanged { is_mocking }) => {
            HeadlessEvent::mocking_changed(*is_mocking)
        }
        EngineEvent::Service(ServiceEvent::OverrideFailed { message }) => {
            HeadlessEvent::override_failed(message)
        }
        EngineEvent::BindTimedOut { attempt } => HeadlessEvent::bind_timed_out(*attempt),
        EngineEvent::BindFailed { message } => HeadlessEvent::error(message.clone(), false),
        EngineEvent::Shutdown => return,
    };
    headless.emit();
}

/// Parse one stdin line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<StdinCommand>> {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return Ok(None);
    };

    let parsed = match command {
        "t" | "toggle" => StdinCommand::Send(Message::ToggleMocking),
        "m" | "map" => {
            let name = parts.next().unwrap_or_default();
            StdinCommand::Send(Message::SelectMapType(name.parse::<MapType>()?))
        }
        "g" | "goto" => {
            let (Some(lat), Some(lon)) = (parts.next(), parts.next()) else {
                return Err(Error::unknown_command(line.trim()));
            };
            let (Ok(latitude), Ok(longitude)) = (lat.parse::<f64>(), lon.parse::<f64>()) else {
                return Err(Error::unknown_command(line.trim()));
            };
            StdinCommand::Send(Message::SelectLocation(LatLng::new(latitude, longitude)?))
        }
        "b" | "bind" | "retry" => StdinCommand::Send(Message::RetryBind),
        "k" | "kill" => StdinCommand::Kill,
        "q" | "quit" => StdinCommand::Send(Message::Quit),
        _ => return Err(Error::unknown_command(command)),
    };

    Ok(Some(parsed))
}

/// Read commands from stdin until `quit` or end of input
fn spawn_stdin_reader_blocking(
    msg_tx: mpsc::Sender<Message>,
    manager: ServiceManager<TracingOverride>,
    component: ComponentName,
    runtime: Handle,
) {
    use std::io::BufRead;

    let stdin = std::io::stdin();
    let reader = stdin.lock();

    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        match parse_command(&line) {
            Ok(Some(StdinCommand::Send(Message::Quit))) => {
                info!("Stdin: quit requested");
                let _ = msg_tx.blocking_send(Message::Quit);
                return;
            }
            Ok(Some(StdinCommand::Send(msg))) => {
                if msg_tx.blocking_send(msg).is_err() {
                    break;
                }
            }
            Ok(Some(StdinCommand::Kill)) => {
                // Disconnect callbacks are spawned onto the runtime
                let _guard = runtime.enter();
                if !manager.kill(&component) {
                    HeadlessEvent::error(format!("{} is not running", component), false).emit();
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("Stdin: {}", e);
                HeadlessEvent::error(e.to_string(), e.is_fatal()).emit();
            }
        }
    }

    // End of input behaves like quit
    info!("Stdin reader exiting");
    let _ = msg_tx.blocking_send(Message::Quit);
}
