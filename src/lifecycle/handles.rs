//! Lifecycle contracts for the coordinated subsystems.
//!
//! The coordinator only relies on these traits; the embedded store and the
//! network server are opaque behind them.

use std::time::Duration;

use async_trait::async_trait;

use crate::lifecycle::error::{ListenError, ShutdownError, StartError};
use crate::lifecycle::readiness::Readiness;

/// Embedded data node.
#[async_trait]
pub trait NodeHandle: Send + Sync + 'static {
    /// Run the node. Blocks until the node is shut down.
    async fn start(&self) -> Result<(), StartError>;

    /// Subscribe to the one-shot readiness notification.
    ///
    /// Only one subscription is allowed; later calls fail with
    /// [`StartError::ReadinessTaken`].
    fn readiness(&self) -> Result<Readiness, StartError>;

    /// Stop the node, waiting up to `deadline`.
    ///
    /// Safe to call while `start()` is running or before it was ever called.
    async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError>;
}

/// Why `serve()` returned without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeExit {
    /// Shutdown was requested.
    Closed,
}

/// Network-facing server.
#[async_trait]
pub trait ServerHandle: Send + Sync + 'static {
    /// Bind and serve until shutdown is requested or serving fails.
    async fn serve(&self) -> Result<ServeExit, ListenError>;

    /// Stop accepting connections and drain in-flight ones until `deadline`,
    /// then force close. A second call returns immediately.
    async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError>;
}
