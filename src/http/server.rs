//! HTTP server setup and lifecycle.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Bind the listener only when `serve()` is called
//! - Graceful shutdown: stop accepting, drain, force close at the deadline
//!
//! # Server States
//! ```text
//! Idle → Serving → Draining → Stopped
//!   └──────── shutdown before serve ──────┘
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{http::StatusCode, middleware, routing::get, Router};
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::HttpConfig;
use crate::http::handlers::{self, AppState};
use crate::http::middleware::request_metrics_middleware;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::lifecycle::{ListenError, ServeExit, ServerHandle, ShutdownError, Subsystem};
use crate::node::EmbeddedNode;

/// Running state of the HTTP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Idle,
    Serving,
    Draining,
    Stopped,
}

/// HTTP server fronting the embedded node.
pub struct HttpServer {
    router: Router,
    config: HttpConfig,
    state: watch::Sender<ServerState>,
    /// Tracks every accepted connection; drains or cuts them off on shutdown.
    handle: Handle,
    shutdown_requested: AtomicBool,
    local_addr: OnceLock<SocketAddr>,
}

impl HttpServer {
    /// Create an unbound server. Nothing listens until `serve()`.
    pub fn new(config: HttpConfig, node: Arc<EmbeddedNode>) -> Self {
        let router = Self::build_router(&config, AppState { node });
        let (state, _) = watch::channel(ServerState::Idle);
        Self {
            router,
            config,
            state,
            handle: Handle::new(),
            shutdown_requested: AtomicBool::new(false),
            local_addr: OnceLock::new(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &HttpConfig, state: AppState) -> Router {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        Router::new()
            .route("/healthz", get(handlers::healthz))
            .route(
                "/kv/{key}",
                get(handlers::get_key)
                    .put(handlers::put_key)
                    .delete(handlers::delete_key),
            )
            .with_state(state)
            .layer(middleware::from_fn(request_metrics_middleware))
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)),
            )
    }

    /// Router with all layers, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> ServerState {
        *self.state.borrow()
    }

    /// Bound address, once `serve()` has bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    fn advance(&self, from: ServerState, to: ServerState) -> bool {
        self.state.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }
}

#[async_trait]
impl ServerHandle for HttpServer {
    async fn serve(&self) -> Result<ServeExit, ListenError> {
        // claim Serving before binding so a concurrent shutdown sees it
        if !self.advance(ServerState::Idle, ServerState::Serving) {
            tracing::debug!(state = ?self.state(), "HTTP server not idle, nothing to serve");
            return Ok(ServeExit::Closed);
        }

        let address = self.config.endpoint();
        let listener = match TcpListener::bind((self.config.address.as_str(), self.config.port)).await {
            Ok(listener) => listener,
            Err(source) => {
                self.state.send_replace(ServerState::Stopped);
                return Err(ListenError::Bind { address, source });
            }
        };
        let listener = match into_std(listener) {
            Ok((local_addr, listener)) => {
                let _ = self.local_addr.set(local_addr);
                tracing::info!(address = %local_addr, "HTTP server listening");
                listener
            }
            Err(e) => {
                self.state.send_replace(ServerState::Stopped);
                return Err(ListenError::Serve(e));
            }
        };

        let result = axum_server::from_tcp(listener)
            .handle(self.handle.clone())
            .serve(self.router.clone().into_make_service())
            .await;

        self.state.send_replace(ServerState::Stopped);
        result.map_err(ListenError::Serve)?;

        tracing::info!("HTTP server stopped");
        if self.shutdown_requested.load(Ordering::SeqCst) {
            Ok(ServeExit::Closed)
        } else {
            Err(ListenError::UnexpectedClose)
        }
    }

    async fn shutdown(&self, deadline: Duration) -> Result<(), ShutdownError> {
        if self.shutdown_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!("HTTP server shutdown already requested");
            return Ok(());
        }

        let mut state = self.state.subscribe();
        if self.advance(ServerState::Idle, ServerState::Stopped) {
            tracing::debug!("HTTP server was never serving");
            return Ok(());
        }
        self.advance(ServerState::Serving, ServerState::Draining);
        tracing::info!(
            deadline_ms = deadline.as_millis() as u64,
            connections = self.handle.connection_count(),
            "HTTP server draining"
        );
        // the deadline is enforced here, not by the handle
        self.handle.graceful_shutdown(None);

        let stopped = async { state.wait_for(|s| *s == ServerState::Stopped).await.map(|_| ()) };
        match tokio::time::timeout(deadline, stopped).await {
            Ok(_) => Ok(()),
            Err(_) => {
                tracing::warn!(
                    connections = self.handle.connection_count(),
                    "Drain deadline passed, closing remaining connections"
                );
                self.handle.shutdown();
                Err(ShutdownError::DeadlineExceeded {
                    subsystem: Subsystem::Server,
                    deadline,
                })
            }
        }
    }
}

fn into_std(listener: TcpListener) -> io::Result<(SocketAddr, std::net::TcpListener)> {
    let addr = listener.local_addr()?;
    Ok((addr, listener.into_std()?))
}
