//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → loader.rs (optional TOML file, `-c`)
//!     → args.rs (CLI flag overrides: -a, -p, -e)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → handed to node, server and coordinator at bootstrap
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::Args;
pub use loader::ConfigError;
pub use schema::{
    AppConfig, Environment, HttpConfig, LogFormat, NodeConfig, ObservabilityConfig,
    ShutdownConfig, TeardownOrder,
};
