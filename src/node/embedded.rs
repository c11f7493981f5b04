//! In-process node implementation.
//!
//! # Responsibilities
//! - Bind the member port (bind failure is a `StartError`)
//! - Fire readiness exactly once, after binding
//! - Serve an in-memory key/value map while running
//! - Stop within the shutdown deadline, whether or not it ever started

use std::net::SocketAddr;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use dashmap::DashMap;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::NodeConfig;
use crate::lifecycle::readiness::{self, ReadinessNotifier, ReadinessSlot};
use crate::lifecycle::{NodeHandle, Readiness, ShutdownError, StartError, Subsystem};
use crate::node::{NodeError, NodeState};

/// Embedded store member running inside this process.
pub struct EmbeddedNode {
    config: NodeConfig,
    store: DashMap<String, Bytes>,
    state: watch::Sender<NodeState>,
    stop: CancellationToken,
    notifier: Mutex<Option<ReadinessNotifier>>,
    readiness: ReadinessSlot,
    local_addr: OnceLock<SocketAddr>,
}

impl EmbeddedNode {
    pub fn new(config: NodeConfig) -> Self {
        let (notifier, readiness) = readiness::channel();
        let (state, _) = watch::channel(NodeState::NotStarted);
        Self {
            config,
            store: DashMap::new(),
            state,
            stop: CancellationToken::new(),
            notifier: Mutex::new(Some(notifier)),
            readiness: ReadinessSlot::new(readiness),
            local_addr: OnceLock::new(),
        }
    }

    pub fn state(&self) -> NodeState {
        *self.state.borrow()
    }

    /// Member address, once bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    pub fn get(&self, key: &str) -> Result<Option<Bytes>, NodeError> {
        self.ensure_running()?;
        Ok(self.store.get(key).map(|entry| entry.value().clone()))
    }

    /// Store a value, returning the previous one.
    pub fn put(&self, key: String, value: Bytes) -> Result<Option<Bytes>, NodeError> {
        self.ensure_running()?;
        Ok(self.store.insert(key, value))
    }

    /// Remove a value, returning it if present.
    pub fn delete(&self, key: &str) -> Result<Option<Bytes>, NodeError> {
        self.ensure_running()?;
        Ok(self.store.remove(key).map(|(_, value)| value))
    }

    fn ensure_running(&self) -> Result<(), NodeError> {
        let state = self.state();
        if state.accepts_operations() {
            Ok(())
        } else {
            Err(NodeError::NotRunning(state))
        }
    }

    /// Move `from` → `to` only if the node is still in `from`.
    fn advance(&self, from: NodeState, to: NodeState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    async fn accept_peers(&self, listener: TcpListener) {
        loop {
            tokio::select! {
                _ = self.stop.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::debug!(peer = %peer, "Closing peer connection, clustering is not enabled");
                        drop(stream);
                    }
                    Err(e) => tracing::warn!(error = %e, "Failed to accept peer connection"),
                },
            }
        }
    }
}

#[async_trait]
impl NodeHandle for EmbeddedNode {
    async fn start(&self) -> Result<(), StartError> {
        let notifier = self
            .notifier
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(StartError::AlreadyStarted)?;

        if !self.advance(NodeState::NotStarted, NodeState::Starting) {
            // shut down before it was ever started
            return Ok(());
        }

        let address = self.config.endpoint();
        tracing::info!(
            environment = %self.config.environment,
            address = %address,
            "Starting embedded node"
        );

        let listener = match TcpListener::bind((self.config.bind_address(), self.config.port)).await {
            Ok(listener) => listener,
            Err(source) => {
                self.state.send_replace(NodeState::Stopped);
                return Err(StartError::Bind { address, source });
            }
        };
        if let Ok(addr) = listener.local_addr() {
            let _ = self.local_addr.set(addr);
        }

        if self.advance(NodeState::Starting, NodeState::Ready) {
            notifier.notify();
            tracing::info!(address = %address, "Node is ready to accept connections");
            self.advance(NodeState::Ready, NodeState::Running);
        }

        self.accept_peers(listener).await;

        self.state.send_replace(NodeState::Stopped);
        tracing::info!(keys = self.store.len(), "Embedded node stopped");
        Ok(())
    }

    fn readiness(&self) -> Result<Readiness, StartError> {
        self.readiness.take()
    }

    async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        let mut state = self.state.subscribe();
        let never_started = self.advance(NodeState::NotStarted, NodeState::Stopped);
        self.stop.cancel();
        if never_started {
            tracing::debug!("Node was never started, nothing to drain");
            return Ok(());
        }

        self.state.send_if_modified(|state| {
            if matches!(state, NodeState::Starting | NodeState::Ready | NodeState::Running) {
                *state = NodeState::ShuttingDown;
                true
            } else {
                false
            }
        });

        let stopped = async { state.wait_for(|s| *s == NodeState::Stopped).await.map(|_| ()) };
        match tokio::time::timeout(deadline, stopped).await {
            Ok(_) => Ok(()),
            Err(_) => Err(ShutdownError::DeadlineExceeded {
                subsystem: Subsystem::Node,
                deadline,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: u16) -> NodeConfig {
        NodeConfig {
            port,
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn rejects_operations_before_start() {
        let node = EmbeddedNode::new(config(0));
        assert_eq!(node.get("a"), Err(NodeError::NotRunning(NodeState::NotStarted)));
    }

    #[tokio::test]
    async fn starts_serves_and_stops() {
        let node = std::sync::Arc::new(EmbeddedNode::new(config(0)));
        let readiness = node.readiness().unwrap();

        let runner = node.clone();
        let task = tokio::spawn(async move { runner.start().await });

        readiness.await.unwrap();
        assert!(node.state().accepts_operations());
        assert!(node.local_addr().is_some());

        node.put("a".into(), Bytes::from_static(b"1")).unwrap();
        assert_eq!(node.get("a").unwrap(), Some(Bytes::from_static(b"1")));
        assert_eq!(node.delete("a").unwrap(), Some(Bytes::from_static(b"1")));
        assert_eq!(node.get("a").unwrap(), None);

        node.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(node.state(), NodeState::Stopped);
        assert!(task.await.unwrap().is_ok());
        assert!(node.get("a").is_err());
    }

    #[tokio::test]
    async fn shutdown_before_start_does_not_block() {
        let node = EmbeddedNode::new(config(0));
        node.shutdown(Duration::from_millis(50)).await.unwrap();
        assert_eq!(node.state(), NodeState::Stopped);

        // a late start is a no-op
        assert!(node.start().await.is_ok());
        assert_eq!(node.state(), NodeState::Stopped);
    }

    #[tokio::test]
    async fn bind_failure_is_start_error() {
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let node = EmbeddedNode::new(config(port));
        let readiness = node.readiness().unwrap();

        assert!(matches!(node.start().await, Err(StartError::Bind { .. })));
        assert!(readiness.await.is_err());
        assert_eq!(node.state(), NodeState::Stopped);
    }

    #[tokio::test]
    async fn start_and_readiness_are_single_use() {
        let node = EmbeddedNode::new(config(0));
        assert!(node.readiness().is_ok());
        assert!(matches!(node.readiness(), Err(StartError::ReadinessTaken)));

        node.shutdown(Duration::from_millis(50)).await.unwrap();
        node.start().await.unwrap();
        assert!(matches!(node.start().await, Err(StartError::AlreadyStarted)));
    }
}
