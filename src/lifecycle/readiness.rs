//! One-shot readiness notification.
//!
//! A node owns the [`ReadinessNotifier`] and consumes it when it can accept
//! operations; the coordinator awaits the paired [`Readiness`]. Consuming the
//! notifier on `notify` makes a second fire unrepresentable. Dropping it
//! without firing resolves the waiter with [`NotifierDropped`].

use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

use crate::lifecycle::error::StartError;

/// Create a linked notifier/waiter pair.
pub fn channel() -> (ReadinessNotifier, Readiness) {
    let (tx, rx) = oneshot::channel();
    (ReadinessNotifier { tx }, Readiness { rx })
}

/// Sending half, held by the node.
#[derive(Debug)]
pub struct ReadinessNotifier {
    tx: oneshot::Sender<()>,
}

impl ReadinessNotifier {
    /// Report readiness. The waiter may already be gone; that is not an error.
    pub fn notify(self) {
        let _ = self.tx.send(());
    }
}

/// The notifier was dropped before the node became ready.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("readiness notifier dropped before the node became ready")]
pub struct NotifierDropped;

/// Receiving half. Resolves once, when the node is ready.
#[derive(Debug)]
pub struct Readiness {
    rx: oneshot::Receiver<()>,
}

impl Future for Readiness {
    type Output = Result<(), NotifierDropped>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.map_err(|_| NotifierDropped))
    }
}

/// Holds a [`Readiness`] until its single subscriber claims it.
#[derive(Debug)]
pub struct ReadinessSlot {
    inner: Mutex<Option<Readiness>>,
}

impl ReadinessSlot {
    pub fn new(readiness: Readiness) -> Self {
        Self {
            inner: Mutex::new(Some(readiness)),
        }
    }

    /// Claim the waiter. Only the first call succeeds.
    pub fn take(&self) -> Result<Readiness, StartError> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StartError::ReadinessTaken)
    }
}
