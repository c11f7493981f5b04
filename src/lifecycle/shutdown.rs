//! Shutdown coordination.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Termination request delivered by the operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl std::fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Process shutdown trigger.
///
/// Cheap to clone; every clone observes the same trigger. Only the first
/// [`Shutdown::trigger`] takes effect and its signal is kept.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
    signal: Arc<OnceLock<TerminationSignal>>,
}

impl Shutdown {
    /// Create a new, untriggered shutdown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Returns `false` if shutdown was already requested.
    pub fn trigger(&self, signal: TerminationSignal) -> bool {
        if self.signal.set(signal).is_err() {
            return false;
        }
        self.token.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The signal that triggered shutdown, if any.
    pub fn signal(&self) -> Option<TerminationSignal> {
        self.signal.get().copied()
    }

    /// Wait until shutdown has been triggered.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_first_trigger_counts() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        assert!(shutdown.trigger(TerminationSignal::Terminate));
        assert!(!shutdown.trigger(TerminationSignal::Interrupt));

        assert!(shutdown.is_triggered());
        assert_eq!(shutdown.signal(), Some(TerminationSignal::Terminate));
    }

    #[tokio::test]
    async fn clones_share_trigger() {
        let shutdown = Shutdown::new();
        let observer = shutdown.clone();

        let waiter = tokio::spawn(async move {
            observer.cancelled().await;
            observer.signal()
        });

        shutdown.trigger(TerminationSignal::Interrupt);
        assert_eq!(waiter.await.unwrap(), Some(TerminationSignal::Interrupt));
        assert!(shutdown.is_triggered());
    }
}
