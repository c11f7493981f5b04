//! Embedded data node.
//!
//! # Data Flow
//! ```text
//! NodeConfig (environment, member address)
//!     → embedded.rs: start() binds the member listener
//!     → readiness fired once bound
//!     → key/value operations accepted while Ready/Running
//!     → shutdown() stops the accept loop, state → Stopped
//! ```
//!
//! # Node States
//! ```text
//! NotStarted → Starting → Ready → Running → ShuttingDown → Stopped
//! ```
//!
//! # Design Decisions
//! - Cluster membership and replication are not implemented; peer
//!   connections are accepted and closed
//! - Operations outside Ready/Running fail fast instead of waiting

pub mod embedded;

use thiserror::Error;

pub use embedded::EmbeddedNode;

/// Running state of the embedded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    NotStarted,
    Starting,
    Ready,
    Running,
    ShuttingDown,
    Stopped,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::NotStarted => "not_started",
            NodeState::Starting => "starting",
            NodeState::Ready => "ready",
            NodeState::Running => "running",
            NodeState::ShuttingDown => "shutting_down",
            NodeState::Stopped => "stopped",
        }
    }

    /// Whether key/value operations are served in this state.
    pub fn accepts_operations(&self) -> bool {
        matches!(self, NodeState::Ready | NodeState::Running)
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by node operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("node is not accepting operations (state: {0})")]
    NotRunning(NodeState),
}
