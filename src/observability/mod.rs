//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator, node, HTTP server produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (lifecycle gauge, shutdown failures, request counters)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every lifecycle event
//! - Metrics recording is a no-op until an exporter is installed

pub mod logging;
pub mod metrics;
