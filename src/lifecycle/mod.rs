//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (coordinator.rs):
//!     spawn node start() → await readiness (readiness.rs) → spawn server serve()
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger (shutdown.rs), first signal only
//!
//! Shutdown (coordinator.rs):
//!     Shutdown triggered → node shutdown → server shutdown → join tasks → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: the server never serves before the node is ready
//! - Ordered shutdown: data layer first by default, configurable
//! - Shutdown has a hard timeout: tasks are aborted after the deadline
//! - Subsystems are reached only through the traits in handles.rs

pub mod coordinator;
pub mod error;
pub mod handles;
pub mod readiness;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use coordinator::{Coordinator, CoordinatorConfig, LifecycleState, ShutdownOutcome};
pub use error::{LifecycleError, ListenError, ShutdownError, StartError, Subsystem};
pub use handles::{NodeHandle, ServeExit, ServerHandle};
pub use readiness::{Readiness, ReadinessNotifier, ReadinessSlot};
pub use shutdown::{Shutdown, TerminationSignal};
pub use signals::SignalWatcher;
