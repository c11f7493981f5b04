//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports non-zero, deadlines positive)
//! - Detect HTTP and node endpoints colliding
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs after file values and CLI overrides are merged

use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyAddress(&'static str),

    #[error("{0} must not be 0")]
    ZeroPort(&'static str),

    #[error("HTTP server and node both bind {0}")]
    EndpointConflict(String),

    #[error("{0} must be greater than 0")]
    ZeroDuration(&'static str),

    #[error("shutdown.hard_timeout_ms ({hard_timeout_ms}) is shorter than shutdown.deadline_ms ({deadline_ms})")]
    HardTimeoutTooShort { hard_timeout_ms: u64, deadline_ms: u64 },

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a merged configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.http.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress("http.address"));
    }
    if config.http.port == 0 {
        errors.push(ValidationError::ZeroPort("http.port"));
    }
    if config.http.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration("http.request_timeout_secs"));
    }

    if config.node.bind_address().trim().is_empty() {
        errors.push(ValidationError::EmptyAddress("node.bind_address"));
    }
    if config.node.port == 0 {
        errors.push(ValidationError::ZeroPort("node.port"));
    }
    if config.node.ready_timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroDuration("node.ready_timeout_ms"));
    }

    if config.http.port == config.node.port
        && addresses_overlap(&config.http.address, config.node.bind_address())
    {
        errors.push(ValidationError::EndpointConflict(config.http.endpoint()));
    }

    if config.shutdown.deadline_ms == 0 {
        errors.push(ValidationError::ZeroDuration("shutdown.deadline_ms"));
    }
    if config.shutdown.hard_timeout_ms < config.shutdown.deadline_ms {
        errors.push(ValidationError::HardTimeoutTooShort {
            hard_timeout_ms: config.shutdown.hard_timeout_ms,
            deadline_ms: config.shutdown.deadline_ms,
        });
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Whether two bind addresses can claim the same port. A wildcard address
/// overlaps every other address.
fn addresses_overlap(a: &str, b: &str) -> bool {
    let wildcard = |addr: &str| addr.parse::<IpAddr>().is_ok_and(|ip| ip.is_unspecified());
    a == b || wildcard(a) || wildcard(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = AppConfig::default();
        config.http.port = 0;
        config.node.port = 0;
        config.shutdown.deadline_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::ZeroPort("http.port")));
        assert!(errors.contains(&ValidationError::ZeroPort("node.port")));
        assert!(errors.contains(&ValidationError::ZeroDuration("shutdown.deadline_ms")));
    }

    #[test]
    fn rejects_shared_endpoint() {
        let mut config = AppConfig::default();
        config.node.port = config.http.port;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EndpointConflict("127.0.0.1:8080".into())]
        );
    }

    #[test]
    fn wildcard_node_address_conflicts_with_loopback() {
        let mut config = AppConfig::default();
        config.node.bind_address = Some("0.0.0.0".into());
        config.node.port = config.http.port;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::EndpointConflict("127.0.0.1:8080".into())]
        );

        config.node.bind_address = Some("::".into());
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn distinct_addresses_may_share_port() {
        let mut config = AppConfig::default();
        config.node.bind_address = Some("127.0.0.2".into());
        config.node.port = config.http.port;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn hard_timeout_must_cover_deadline() {
        let mut config = AppConfig::default();
        config.shutdown.deadline_ms = 5_000;
        config.shutdown.hard_timeout_ms = 1_000;

        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors[0],
            ValidationError::HardTimeoutTooShort { hard_timeout_ms: 1_000, deadline_ms: 5_000 }
        ));
    }

    #[test]
    fn rejects_bad_metrics_address() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = Some("not-an-addr".into());
        assert!(validate_config(&config).is_err());
    }
}
