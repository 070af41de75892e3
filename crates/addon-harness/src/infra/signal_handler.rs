//! SIGINT/SIGTERM handling.

use tokio::sync::watch;

#[cfg(unix)]
use std::thread;
#[cfg(unix)]
use std::thread::JoinHandle;

#[cfg(unix)]
use signal_hook::consts::SIGINT;
#[cfg(unix)]
use signal_hook::consts::SIGTERM;
#[cfg(unix)]
use signal_hook::iterator::Signals;
#[cfg(unix)]
use tracing::info;

use crate::infra::supervisor::SupervisorError;

/// Flips the watch channel to `true` on the first termination signal.
pub struct SignalHandler {
    #[cfg(unix)]
    _handle: JoinHandle<()>,
    receiver: watch::Receiver<bool>,
}

impl SignalHandler {
    #[cfg(unix)]
    pub fn setup() -> Result<Self, SupervisorError> {
        let (sender, receiver) = watch::channel(false);
        let mut signals = Signals::new([SIGINT, SIGTERM])
            .map_err(|e| SupervisorError::SignalSetup(e.to_string()))?;

        let handle = thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    info!(signal = sig, "Received signal, shutting down children");
                    let _ = sender.send(true);
                }
            })
            .map_err(|e| {
                SupervisorError::SignalSetup(format!("failed to spawn signal handler: {e}"))
            })?;

        Ok(Self {
            _handle: handle,
            receiver,
        })
    }

    #[cfg(not(unix))]
    pub fn setup() -> Result<Self, SupervisorError> {
        let (sender, receiver) = watch::channel(false);
        std::mem::forget(sender);
        Ok(Self { receiver })
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.receiver.clone()
    }
}

/// Resolves once `rx` reports `true`. A closed channel never resolves.
pub async fn interrupted(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
