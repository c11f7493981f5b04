//! Command-line flags.
//!
//! Flags override values from the optional config file, which override the
//! built-in defaults. `-h` prints usage and exits 0; unknown or malformed
//! flags make clap exit non-zero.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::validate_config;

const ABOUT: &str = "\
Runs an embedded data node and an HTTP server in one process.

Demonstrates the embedded member deployment scenario: the HTTP server only
starts once the node is ready, and SIGINT/SIGTERM shut both down in order.";

#[derive(Debug, Parser)]
#[command(name = "nodehost", version, about = ABOUT)]
pub struct Args {
    /// Bind address for the HTTP server [default: 127.0.0.1]
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,

    /// Port for the HTTP server [default: 8080]
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Deployment environment for the embedded node
    #[arg(short = 'e', long = "env", value_enum)]
    pub environment: Option<Environment>,
}

impl Args {
    /// Merge defaults, the config file and flags, then validate.
    pub fn into_config(self) -> Result<AppConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => AppConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(address) = &self.address {
            config.http.address = address.clone();
        }
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(environment) = self.environment {
            config.node.environment = environment;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn defaults_without_flags() {
        let config = Args::try_parse_from(["nodehost"]).unwrap().into_config().unwrap();
        assert_eq!(config.http.address, "127.0.0.1");
        assert_eq!(config.http.port, 8080);
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from(["nodehost", "-a", "0.0.0.0", "-p", "9090", "-e", "wan"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.http.endpoint(), "0.0.0.0:9090");
        assert_eq!(config.node.environment, Environment::Wan);
    }

    #[test]
    fn help_is_not_a_failure() {
        let err = Args::try_parse_from(["nodehost", "-h"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn malformed_port_is_rejected() {
        let err = Args::try_parse_from(["nodehost", "-p", "eighty"]).unwrap_err();
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let err = Args::try_parse_from(["nodehost", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn zero_port_fails_validation() {
        let args = Args::try_parse_from(["nodehost", "-p", "0"]).unwrap();
        assert!(matches!(args.into_config(), Err(ConfigError::Validation(_))));
    }
}
