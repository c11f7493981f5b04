//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT and SIGTERM handlers once, at process start
//! - Translate signals to [`TerminationSignal`] events
//! - Trigger [`Shutdown`] on the first event only
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Signals arrive over an mpsc channel so tests can inject them
//! - Repeated signals are logged and ignored (no re-entrant teardown)

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{Shutdown, TerminationSignal};

const SIGNAL_BUFFER: usize = 8;

/// Background task turning termination signals into a single shutdown.
pub struct SignalWatcher {
    shutdown: Shutdown,
    events: mpsc::Receiver<TerminationSignal>,
}

impl SignalWatcher {
    /// Watch an arbitrary source of termination events.
    pub fn new(shutdown: Shutdown, events: mpsc::Receiver<TerminationSignal>) -> Self {
        Self { shutdown, events }
    }

    /// Watch the operating system's termination signals.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_os(shutdown: Shutdown) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        forward_os_signals(tx)?;
        Ok(Self::new(shutdown, rx))
    }

    /// Run the watcher on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(signal) = self.events.recv().await {
            if self.shutdown.trigger(signal) {
                tracing::info!(signal = %signal, "Signal caught, initiating shutdown");
            } else {
                tracing::warn!(signal = %signal, "Shutdown already in progress, ignoring signal");
            }
        }
        tracing::debug!("Signal source closed, watcher exiting");
    }
}

#[cfg(unix)]
fn forward_os_signals(tx: mpsc::Sender<TerminationSignal>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = sigint.recv() => TerminationSignal::Interrupt,
                Some(()) = sigterm.recv() => TerminationSignal::Terminate,
                else => break,
            };
            if tx.send(received).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn forward_os_signals(tx: mpsc::Sender<TerminationSignal>) -> std::io::Result<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(TerminationSignal::Interrupt).await.is_err() {
                break;
            }
        }
    });
    Ok(())
}
