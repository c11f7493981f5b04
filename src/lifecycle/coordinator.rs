//! Lifecycle coordinator.
//!
//! # State Machine
//! ```text
//! Init → NodeStarting → NodeReady → Serving → Draining → Stopped
//!             │                                   ▲
//!             └── start failure / shutdown ───────┘
//! ```
//!
//! - `NodeStarting`: node `start()` runs on its own task
//! - `NodeReady`: readiness arrived; the server has not been touched yet
//! - `Serving`: server `serve()` runs on its own task; the coordinator waits
//!   for a termination request or a fatal subsystem exit
//! - `Draining`: both handles are shut down, in the configured order, once
//! - `Stopped`: background tasks are joined or aborted at the hard timeout
//!
//! Startup failures are returned as [`LifecycleError`]. Shutdown failures are
//! logged and recorded in [`ShutdownOutcome`], never returned as errors.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use crate::config::{AppConfig, TeardownOrder};
use crate::lifecycle::error::{LifecycleError, ListenError, ShutdownError, StartError, Subsystem};
use crate::lifecycle::handles::{NodeHandle, ServeExit, ServerHandle};
use crate::lifecycle::readiness::Readiness;
use crate::lifecycle::shutdown::{Shutdown, TerminationSignal};
use crate::observability::metrics;

type NodeTask = JoinHandle<Result<(), StartError>>;
type ServerTask = JoinHandle<Result<ServeExit, ListenError>>;

/// Coordinator state, published on a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Init,
    NodeStarting,
    NodeReady,
    Serving,
    Draining,
    Stopped,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Init => "init",
            LifecycleState::NodeStarting => "node_starting",
            LifecycleState::NodeReady => "node_ready",
            LifecycleState::Serving => "serving",
            LifecycleState::Draining => "draining",
            LifecycleState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and ordering knobs for a coordinator run.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Drain deadline passed to each handle's `shutdown`.
    pub shutdown_deadline: Duration,
    /// Bound on the whole teardown, including joining background tasks.
    pub hard_timeout: Duration,
    /// Which handle is shut down first.
    pub order: TeardownOrder,
    /// Bound on waiting for readiness. `None` waits forever.
    pub ready_timeout: Option<Duration>,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            shutdown_deadline: Duration::from_secs(10),
            hard_timeout: Duration::from_secs(15),
            order: TeardownOrder::NodeFirst,
            ready_timeout: None,
        }
    }
}

impl From<&AppConfig> for CoordinatorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            shutdown_deadline: config.shutdown.deadline(),
            hard_timeout: config.shutdown.hard_timeout(),
            order: config.shutdown.order,
            ready_timeout: config.node.ready_timeout(),
        }
    }
}

/// Result of the single teardown attempt.
#[derive(Debug)]
pub struct ShutdownOutcome {
    /// Signal that caused the shutdown, `None` for failure-driven teardown.
    pub signal: Option<TerminationSignal>,
    pub node: Result<(), ShutdownError>,
    pub server: Result<(), ShutdownError>,
}

impl ShutdownOutcome {
    /// Both handles stopped within their deadlines.
    pub fn is_clean(&self) -> bool {
        self.node.is_ok() && self.server.is_ok()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ShutdownError> {
        self.node
            .as_ref()
            .err()
            .into_iter()
            .chain(self.server.as_ref().err())
    }
}

enum Startup {
    Ready,
    Cancelled,
    TimedOut(StartError),
    Exited(Result<Result<(), StartError>, JoinError>),
}

enum Serving {
    Signalled,
    NodeExited(Result<Result<(), StartError>, JoinError>),
    ServerExited(Result<Result<ServeExit, ListenError>, JoinError>),
}

/// Owns the node and server handles and sequences their lifecycles.
pub struct Coordinator<N: ?Sized, S: ?Sized> {
    node: Arc<N>,
    server: Arc<S>,
    shutdown: Shutdown,
    config: CoordinatorConfig,
    state: watch::Sender<LifecycleState>,
}

impl<N, S> Coordinator<N, S>
where
    N: NodeHandle + ?Sized,
    S: ServerHandle + ?Sized,
{
    pub fn new(node: Arc<N>, server: Arc<S>, shutdown: Shutdown, config: CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(LifecycleState::Init);
        Self {
            node,
            server,
            shutdown,
            config,
            state,
        }
    }

    /// Observe state transitions.
    pub fn state(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Run the full lifecycle: start the node, serve once it is ready, and
    /// tear both down when shutdown is triggered.
    pub async fn run(self) -> Result<ShutdownOutcome, LifecycleError> {
        let readiness = match self.node.readiness() {
            Ok(readiness) => readiness,
            Err(err) => {
                self.transition(LifecycleState::Stopped);
                return Err(err.into());
            }
        };

        self.transition(LifecycleState::NodeStarting);
        let mut node_task = self.spawn_node();

        let startup = tokio::select! {
            ready = self.wait_ready(readiness) => match ready {
                Ok(()) => Startup::Ready,
                Err(err) => Startup::TimedOut(err),
            },
            joined = &mut node_task => Startup::Exited(joined),
            _ = self.shutdown.cancelled() => Startup::Cancelled,
        };

        match startup {
            Startup::Ready => {}
            Startup::Cancelled => {
                tracing::info!("Shutdown requested before the node became ready, server will not start");
                return Ok(self.teardown(Some(node_task), None).await);
            }
            Startup::TimedOut(err) => {
                tracing::error!(error = %err, "Node failed to start");
                self.teardown(Some(node_task), None).await;
                return Err(err.into());
            }
            Startup::Exited(joined) => {
                let err = start_failure(joined);
                tracing::error!(error = %err, "Node failed to start");
                self.teardown(None, None).await;
                return Err(err.into());
            }
        }

        self.transition(LifecycleState::NodeReady);
        let mut server_task = self.spawn_server();
        self.transition(LifecycleState::Serving);

        let serving = tokio::select! {
            _ = self.shutdown.cancelled() => Serving::Signalled,
            joined = &mut node_task => Serving::NodeExited(joined),
            joined = &mut server_task => Serving::ServerExited(joined),
        };

        match serving {
            Serving::Signalled => Ok(self.teardown(Some(node_task), Some(server_task)).await),
            Serving::NodeExited(joined) => {
                let err = start_failure(joined);
                tracing::error!(error = %err, "Node stopped while serving");
                self.teardown(None, Some(server_task)).await;
                Err(err.into())
            }
            Serving::ServerExited(joined) => {
                let err = listen_failure(joined);
                tracing::error!(error = %err, "Server stopped serving");
                self.teardown(Some(node_task), None).await;
                Err(err.into())
            }
        }
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        if previous != next {
            tracing::info!(from = %previous, to = %next, "Lifecycle transition");
            metrics::record_lifecycle_state(next);
        }
    }

    fn spawn_node(&self) -> NodeTask {
        let node = Arc::clone(&self.node);
        tokio::spawn(async move { node.start().await })
    }

    fn spawn_server(&self) -> ServerTask {
        let server = Arc::clone(&self.server);
        tokio::spawn(async move { server.serve().await })
    }

    /// Wait for readiness, bounded only if a ready timeout is configured.
    async fn wait_ready(&self, readiness: Readiness) -> Result<(), StartError> {
        let notified = async {
            if readiness.await.is_err() {
                // start() is about to fail; its task result carries the cause
                tracing::warn!("Node dropped its readiness notifier");
                std::future::pending::<()>().await;
            }
        };

        match self.config.ready_timeout {
            Some(limit) => tokio::time::timeout(limit, notified)
                .await
                .map_err(|_| StartError::ReadinessTimeout(limit)),
            None => {
                notified.await;
                Ok(())
            }
        }
    }

    /// Shut both handles down exactly once, then join their tasks.
    async fn teardown(&self, node_task: Option<NodeTask>, server_task: Option<ServerTask>) -> ShutdownOutcome {
        self.transition(LifecycleState::Draining);

        let deadline = self.config.shutdown_deadline;
        let until = Instant::now() + self.config.hard_timeout;
        tracing::info!(
            order = ?self.config.order,
            deadline_ms = deadline.as_millis() as u64,
            "Draining subsystems"
        );

        let (node, server) = match self.config.order {
            TeardownOrder::NodeFirst => {
                let node = self.bounded(Subsystem::Node, self.node.shutdown(deadline), until).await;
                let server = self.bounded(Subsystem::Server, self.server.shutdown(deadline), until).await;
                (node, server)
            }
            TeardownOrder::ServerFirst => {
                let server = self.bounded(Subsystem::Server, self.server.shutdown(deadline), until).await;
                let node = self.bounded(Subsystem::Node, self.node.shutdown(deadline), until).await;
                (node, server)
            }
        };

        if let Some(task) = server_task {
            join_within(Subsystem::Server, task, until).await;
        }
        if let Some(task) = node_task {
            join_within(Subsystem::Node, task, until).await;
        }

        self.transition(LifecycleState::Stopped);
        ShutdownOutcome {
            signal: self.shutdown.signal(),
            node,
            server,
        }
    }

    async fn bounded<F>(&self, subsystem: Subsystem, shutdown: F, until: Instant) -> Result<(), ShutdownError>
    where
        F: Future<Output = Result<(), ShutdownError>>,
    {
        tracing::info!(subsystem = %subsystem, "Shutting down");
        let result = tokio::time::timeout_at(until, shutdown)
            .await
            .unwrap_or_else(|_| {
                Err(ShutdownError::DeadlineExceeded {
                    subsystem,
                    deadline: self.config.hard_timeout,
                })
            });

        match &result {
            Ok(()) => tracing::info!(subsystem = %subsystem, "Shutdown complete"),
            Err(err) => {
                tracing::error!(subsystem = %subsystem, error = %err, "Failed to shut down cleanly");
                metrics::record_shutdown_failure(subsystem);
            }
        }
        result
    }
}

fn start_failure(joined: Result<Result<(), StartError>, JoinError>) -> StartError {
    match joined {
        Ok(Err(err)) => err,
        Ok(Ok(())) => StartError::Exited,
        Err(err) => StartError::Panicked(err.to_string()),
    }
}

fn listen_failure(joined: Result<Result<ServeExit, ListenError>, JoinError>) -> ListenError {
    match joined {
        Ok(Err(err)) => err,
        Ok(Ok(ServeExit::Closed)) => ListenError::UnexpectedClose,
        Err(err) => ListenError::Panicked(err.to_string()),
    }
}

/// Wait for a background task to finish, aborting it at `until`.
async fn join_within<T, E: Display>(subsystem: Subsystem, mut task: JoinHandle<Result<T, E>>, until: Instant) {
    match tokio::time::timeout_at(until, &mut task).await {
        Ok(Ok(Ok(_))) => tracing::debug!(subsystem = %subsystem, "Task finished"),
        Ok(Ok(Err(err))) => {
            tracing::warn!(subsystem = %subsystem, error = %err, "Task returned an error while stopping")
        }
        Ok(Err(err)) => tracing::error!(subsystem = %subsystem, error = %err, "Task panicked"),
        Err(_) => {
            tracing::warn!(subsystem = %subsystem, "Task still running at hard timeout, aborting");
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered() {
        assert!(LifecycleState::Init < LifecycleState::NodeStarting);
        assert!(LifecycleState::NodeReady < LifecycleState::Serving);
        assert!(LifecycleState::Draining < LifecycleState::Stopped);
    }

    #[test]
    fn outcome_lists_failures() {
        let outcome = ShutdownOutcome {
            signal: Some(TerminationSignal::Terminate),
            node: Err(ShutdownError::Failed {
                subsystem: Subsystem::Node,
                reason: "boom".into(),
            }),
            server: Ok(()),
        };
        assert!(!outcome.is_clean());
        let failures: Vec<_> = outcome.failures().map(ShutdownError::subsystem).collect();
        assert_eq!(failures, vec![Subsystem::Node]);
    }

    #[test]
    fn config_from_app_config() {
        let mut app = AppConfig::default();
        app.shutdown.order = TeardownOrder::ServerFirst;
        app.node.ready_timeout_ms = Some(250);

        let config = CoordinatorConfig::from(&app);
        assert_eq!(config.order, TeardownOrder::ServerFirst);
        assert_eq!(config.ready_timeout, Some(Duration::from_millis(250)));
        assert_eq!(config.shutdown_deadline, Duration::from_secs(10));
    }

    #[test]
    fn task_errors_map_to_lifecycle_errors() {
        assert!(matches!(start_failure(Ok(Ok(()))), StartError::Exited));
        assert!(matches!(
            listen_failure(Ok(Ok(ServeExit::Closed))),
            ListenError::UnexpectedClose
        ));
    }
}
