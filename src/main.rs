//! Embedded node host.
//!
//! # Architecture Overview
//!
//! ```text
//!   SIGINT / SIGTERM
//!         │
//!         ▼
//!  ┌──────────────┐  trigger once  ┌────────────────────────────────────────┐
//!  │SignalWatcher │───────────────▶│              Coordinator               │
//!  └──────────────┘                │                                        │
//!                                  │  1. spawn node.start()                 │
//!                                  │  2. await readiness ◀──────────┐       │
//!                                  │  3. spawn server.serve()       │       │
//!                                  │  4. on shutdown:               │       │
//!                                  │     node.shutdown(deadline)    │       │
//!                                  │     server.shutdown(deadline)  │       │
//!                                  └──────┬──────────────────┬──────┼───────┘
//!                                         │                  │      │
//!                                         ▼                  ▼      │
//!                                  ┌─────────────┐    ┌─────────────┴┐
//!                                  │ HttpServer  │───▶│ EmbeddedNode │
//!                                  │  (axum)     │    │  (kv, member │
//!                                  └─────────────┘    │   listener)  │
//!                                                     └──────────────┘
//! ```
//!
//! Exit codes: 0 on clean or signal-initiated shutdown, 1 on startup or
//! listen failure, 2 on configuration errors.

use std::net::SocketAddr;
use std::process::ExitCode;

use clap::Parser;

use nodehost::config::Args;
use nodehost::lifecycle::startup;
use nodehost::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Args::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nodehost: [ERROR] {e}");
            return ExitCode::from(2);
        }
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "nodehost starting");
    tracing::info!(
        http = %config.http.endpoint(),
        node = %config.node.endpoint(),
        environment = %config.node.environment,
        "Configuration loaded"
    );

    if let Some(addr) = config
        .observability
        .metrics_address
        .as_deref()
        .and_then(|addr| addr.parse::<SocketAddr>().ok())
    {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
        }
    }

    match startup::run(config).await {
        Ok(outcome) => {
            for failure in outcome.failures() {
                tracing::warn!(error = %failure, "Shutdown finished with errors");
            }
            tracing::info!("Good bye!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal lifecycle error");
            ExitCode::FAILURE
        }
    }
}
