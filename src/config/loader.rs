//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::TransportConfig;
use crate::config::validation::{ValidationError, validate_config};
use crate::connection::HostParseError;

/// Error type for configuration and construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax errors and unrecognized keys.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    InvalidHost(#[from] HostParseError),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<TransportConfig, ConfigError> {
    let config: TransportConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<TransportConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DeadPoolKind, SelectorKind};

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            hosts = ["a:9200", "b:9200"]
            selector = "sticky_round_robin"
            dead_pool = "backoff"
            sniff_on_start = true
            sniff_after_requests = 500
            max_retries = 1
            dead_timeout_secs = 30

            [connection_params]
            timeout_secs = 10
            headers = { authorization = "Basic Zm9vOmJhcg==" }

            [logging]
            level = "cluster_transport=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.hosts.len(), 2);
        assert_eq!(config.selector, SelectorKind::StickyRoundRobin);
        assert_eq!(config.dead_pool, DeadPoolKind::Backoff);
        assert_eq!(config.sniff_after_requests, Some(500));
        assert_eq!(config.max_retries, Some(1));
        assert!(config.randomize_hosts);
        assert_eq!(config.connection_params["timeout_secs"], serde_json::json!(10));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse_config("hosts = [\"a\"]\nsniff_on_boot = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("sniff_on_boot"));

        let err = parse_config("[logging]\ncolour = true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_malformed_port_is_validation_error() {
        let err = parse_config("hosts = [\"a:\"]").unwrap_err();
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
            other => panic!("unexpected error: {other}"),
        }
    }
}
