//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host
//! process. All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub http: HttpConfig,

    /// Embedded node settings.
    pub node: NodeConfig,

    /// Graceful shutdown settings.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address (IP or hostname).
    pub address: String,

    /// Bind port.
    pub port: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    /// `address:port` as used for binding and logging.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// Deployment topology hint for the embedded node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Single host, loopback only.
    #[default]
    Local,
    /// Members on the same network.
    Lan,
    /// Members across networks.
    Wan,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Lan => "lan",
            Environment::Wan => "wan",
        }
    }

    /// Member bind address used when none is configured.
    pub fn default_bind_address(&self) -> &'static str {
        match self {
            Environment::Local => "127.0.0.1",
            Environment::Lan | Environment::Wan => "0.0.0.0",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Embedded node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Deployment environment preset.
    pub environment: Environment,

    /// Member bind address. Defaults from `environment` when unset.
    pub bind_address: Option<String>,

    /// Member port.
    pub port: u16,

    /// Optional bound on waiting for readiness. Unbounded when unset.
    pub ready_timeout_ms: Option<u64>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            bind_address: None,
            port: 3320,
            ready_timeout_ms: None,
        }
    }
}

impl NodeConfig {
    /// Effective member bind address.
    pub fn bind_address(&self) -> &str {
        self.bind_address
            .as_deref()
            .unwrap_or(self.environment.default_bind_address())
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.bind_address(), self.port)
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }
}

/// Order in which subsystems are stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TeardownOrder {
    /// Stop the data layer first so in-flight requests fail fast.
    #[default]
    NodeFirst,
    /// Drain HTTP traffic first, then stop the node.
    ServerFirst,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Drain deadline handed to each subsystem.
    pub deadline_ms: u64,

    /// Upper bound for the whole teardown, after which tasks are aborted.
    pub hard_timeout_ms: u64,

    /// Which subsystem is stopped first.
    pub order: TeardownOrder,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 10_000,
            hard_timeout_ms: 15_000,
            order: TeardownOrder::default(),
        }
    }
}

impl ShutdownConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn hard_timeout(&self) -> Duration {
        Duration::from_millis(self.hard_timeout_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives. `RUST_LOG` takes precedence.
    pub log_level: Option<String>,

    /// Log output format.
    pub log_format: LogFormat,

    /// Prometheus scrape address (e.g. "127.0.0.1:9000"). Disabled when unset.
    pub metrics_address: Option<String>,
}
