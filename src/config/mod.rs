//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, unknown keys rejected)
//!     → validation.rs (semantic checks, host syntax)
//!     → TransportConfig (validated, immutable)
//!     → TransportBuilder::from_config
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → unchanged host lists are dropped
//!     → new host list applied with Transport::rebuild
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - No network activity happens before validation succeeds

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, load_config, parse_config};
pub use schema::{
    ConnectionKind, ConnectionPoolKind, DeadPoolKind, LoggingConfig, SelectorKind, SerializerKind,
    SnifferKind, TransportConfig,
};
pub use validation::{ValidationError, validate_config};
pub use watcher::{ConfigWatcher, HostListReloader};
