//! Error types for subsystem lifecycle calls.
//!
//! # Design Decisions
//! - Startup errors (`StartError`, `ListenError`) are fatal to the process
//! - `ShutdownError` is recorded and logged only, never escalated
//! - Each error names the subsystem it came from

use std::time::Duration;
use thiserror::Error;

/// Subsystem owned by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    Node,
    Server,
}

impl Subsystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subsystem::Node => "node",
            Subsystem::Server => "server",
        }
    }
}

impl std::fmt::Display for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The embedded node failed to come up.
#[derive(Debug, Error)]
pub enum StartError {
    /// The member listener could not be bound.
    #[error("failed to bind node address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// The node rejected its configuration.
    #[error("node rejected configuration: {0}")]
    Config(String),

    /// `start()` was called more than once.
    #[error("node was already started")]
    AlreadyStarted,

    /// The readiness notification has already been claimed.
    #[error("readiness notification was already subscribed to")]
    ReadinessTaken,

    /// Readiness did not arrive within the configured bound.
    #[error("node did not become ready within {0:?}")]
    ReadinessTimeout(Duration),

    /// `start()` returned without a shutdown request.
    #[error("node stopped unexpectedly")]
    Exited,

    /// The task running `start()` panicked or was cancelled.
    #[error("node task failed: {0}")]
    Panicked(String),
}

/// The network server failed to bind or serve.
#[derive(Debug, Error)]
pub enum ListenError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server I/O error: {0}")]
    Serve(#[source] std::io::Error),

    /// `serve()` returned without a shutdown request.
    #[error("server stopped without a shutdown request")]
    UnexpectedClose,

    #[error("server task failed: {0}")]
    Panicked(String),
}

/// A subsystem did not stop cleanly.
#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("{subsystem} did not drain within {deadline:?}")]
    DeadlineExceeded {
        subsystem: Subsystem,
        deadline: Duration,
    },

    #[error("{subsystem} shutdown failed: {reason}")]
    Failed {
        subsystem: Subsystem,
        reason: String,
    },
}

impl ShutdownError {
    pub fn subsystem(&self) -> Subsystem {
        match self {
            ShutdownError::DeadlineExceeded { subsystem, .. } => *subsystem,
            ShutdownError::Failed { subsystem, .. } => *subsystem,
        }
    }
}

/// Fatal error that ends a coordinator run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Start(#[from] StartError),

    #[error(transparent)]
    Listen(#[from] ListenError),

    /// OS signal handlers could not be installed.
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}
