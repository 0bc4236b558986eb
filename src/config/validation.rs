//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntax and unknown keys)
//! - Validate every host descriptor
//! - Validate value ranges and option combinations
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before any connection is created

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::{ConnectionPoolKind, TransportConfig};
use crate::connection::{Host, HostParseError, HttpConnectionParams};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one host is required")]
    NoHosts,

    #[error(transparent)]
    InvalidHost(#[from] HostParseError),

    #[error("dead_timeout_secs must be greater than zero")]
    ZeroDeadTimeout,

    #[error("max_dead_timeout_secs ({max}) is lower than dead_timeout_secs ({base})")]
    DeadTimeoutCap { base: u64, max: u64 },

    #[error("sniff_after_requests must be greater than zero (omit it to disable)")]
    ZeroSniffAfterRequests,

    #[error("sniff_interval_secs must be greater than zero (omit it to disable)")]
    ZeroSniffInterval,

    #[error("sniffing options are set but the static connection pool ignores sniffed topology")]
    SniffingWithStaticPool,

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid connection parameters: {0}")]
    InvalidConnectionParams(String),
}

pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hosts.is_empty() {
        errors.push(ValidationError::NoHosts);
    }
    for host in &config.hosts {
        if let Err(e) = host.parse::<Host>() {
            errors.push(e.into());
        }
    }

    if config.dead_timeout_secs == 0 {
        errors.push(ValidationError::ZeroDeadTimeout);
    }
    if config.max_dead_timeout_secs < config.dead_timeout_secs {
        errors.push(ValidationError::DeadTimeoutCap {
            base: config.dead_timeout_secs,
            max: config.max_dead_timeout_secs,
        });
    }

    if config.sniff_after_requests == Some(0) {
        errors.push(ValidationError::ZeroSniffAfterRequests);
    }
    if config.sniff_interval_secs == Some(0) {
        errors.push(ValidationError::ZeroSniffInterval);
    }
    if config.connection_pool == ConnectionPoolKind::Static && config.sniffing_enabled() {
        errors.push(ValidationError::SniffingWithStaticPool);
    }

    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if let Err(e) = HttpConnectionParams::from_params(&config.connection_params) {
        errors.push(ValidationError::InvalidConnectionParams(e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
