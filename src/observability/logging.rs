//! Structured logging setup.
//!
//! # Responsibilities
//! - Install a default subscriber when the caller has not supplied one
//! - Route output to stderr, stdout or a file
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level
//! - An already installed global subscriber is treated as the caller's logger
//!   and left untouched

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigError, LoggingConfig};

/// What `init` ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingSetup {
    /// Our subscriber is now the global default.
    Installed,
    /// A subscriber was already installed by the caller.
    External,
    /// Logging disabled by configuration.
    Disabled,
}

pub fn init(config: &LoggingConfig) -> Result<LoggingSetup, ConfigError> {
    if !config.enabled {
        return Ok(LoggingSetup::Disabled);
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConfigError::Logging(format!("invalid level '{}': {}", config.level, e)))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.destination.as_str() {
        "stderr" => fmt::layer().with_writer(std::io::stderr).boxed(),
        "stdout" => fmt::layer().with_writer(std::io::stdout).boxed(),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::Logging(format!("cannot open '{}': {}", path, e)))?;
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .boxed()
        }
    };

    match tracing_subscriber::registry().with(fmt_layer).with(filter).try_init() {
        Ok(()) => Ok(LoggingSetup::Installed),
        Err(_) => Ok(LoggingSetup::External),
    }
}
