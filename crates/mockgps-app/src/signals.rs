//! Termination signals mapped onto [`Message::Quit`]

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mockgps_core::prelude::*;

use crate::message::Message;

/// Post `Message::Quit` to the engine on the first SIGINT/SIGTERM (Ctrl+C
/// elsewhere). The task ends after one signal.
pub fn spawn_signal_handler(tx: mpsc::Sender<Message>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let signal = match next_signal().await {
            Ok(signal) => signal,
            Err(e) => {
                error!("Signal handler disabled: {}", e);
                return;
            }
        };

        info!("Received {}, quitting", signal);
        if tx.send(Message::Quit).await.is_err() {
            debug!("Engine already gone when {} arrived", signal);
        }
    })
}

/// Name of the first termination signal delivered to the process
async fn next_signal() -> Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let listen = |kind: SignalKind, name: &str| {
            signal(kind).map_err(|e| Error::startup(format!("Cannot listen for {}: {}", name, e)))
        };
        let mut sigint = listen(SignalKind::interrupt(), "SIGINT")?;
        let mut sigterm = listen(SignalKind::terminate(), "SIGTERM")?;

        Ok(tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        })
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::startup(format!("Cannot listen for Ctrl+C: {}", e)))?;
        Ok("Ctrl+C")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_handler_stays_quiet_without_signal() {
        let (tx, mut rx) = mpsc::channel::<Message>(1);
        let handle = spawn_signal_handler(tx);

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(rx.try_recv().is_err());
        assert!(!handle.is_finished());
        handle.abort();
    }
}
