//! Process bootstrap.
//!
//! # Responsibilities
//! - Subscribe to termination signals before anything starts
//! - Build the node and the (unbound) HTTP server from config
//! - Hand both to the coordinator and run it to completion
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when the node is ready)

use std::sync::Arc;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::{
    Coordinator, CoordinatorConfig, LifecycleError, Shutdown, ShutdownOutcome, SignalWatcher,
};
use crate::node::EmbeddedNode;

/// Run node and server until a termination signal, then tear both down.
pub async fn run(config: AppConfig) -> Result<ShutdownOutcome, LifecycleError> {
    let shutdown = Shutdown::new();
    SignalWatcher::from_os(shutdown.clone())
        .map_err(LifecycleError::Signals)?
        .spawn();

    let node = Arc::new(EmbeddedNode::new(config.node.clone()));
    let server = Arc::new(HttpServer::new(config.http.clone(), Arc::clone(&node)));

    Coordinator::new(node, server, shutdown, CoordinatorConfig::from(&config))
        .run()
        .await
}
