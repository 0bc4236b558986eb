//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the transport.
//! All types derive Serde traits for deserialization from config files; unknown
//! keys are rejected.

use serde::{Deserialize, Serialize};

/// Root configuration for the cluster transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportConfig {
    /// Seed hosts (`"host"` or `"host:port"`).
    pub hosts: Vec<String>,

    /// Connection implementation.
    pub connection: ConnectionKind,

    /// Connection pool implementation.
    pub connection_pool: ConnectionPoolKind,

    /// Selection policy.
    pub selector: SelectorKind,

    /// Dead pool implementation.
    pub dead_pool: DeadPoolKind,

    /// Sniffer implementation.
    pub sniffer: SnifferKind,

    /// Serializer implementation.
    pub serializer: SerializerKind,

    /// Refresh the topology once before the first request.
    pub sniff_on_start: bool,

    /// Refresh the topology in the background every N requests.
    pub sniff_after_requests: Option<u64>,

    /// Refresh the topology after a failed attempt, before retrying.
    pub sniff_on_connection_fail: bool,

    /// Refresh the topology periodically (seconds).
    pub sniff_interval_secs: Option<u64>,

    /// Shuffle the host order whenever the pool is (re)built.
    pub randomize_hosts: bool,

    /// Retries per logical request; defaults to the number of hosts.
    pub max_retries: Option<u32>,

    /// Seconds a failed connection stays dead.
    pub dead_timeout_secs: u64,

    /// Upper bound for the `backoff` dead pool (seconds).
    pub max_dead_timeout_secs: u64,

    /// Opaque, connection-specific parameters.
    pub connection_params: serde_json::Map<String, serde_json::Value>,

    /// Logging settings used when no subscriber is installed by the caller.
    pub logging: LoggingConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost:9200".to_string()],
            connection: ConnectionKind::default(),
            connection_pool: ConnectionPoolKind::default(),
            selector: SelectorKind::default(),
            dead_pool: DeadPoolKind::default(),
            sniffer: SnifferKind::default(),
            serializer: SerializerKind::default(),
            sniff_on_start: false,
            sniff_after_requests: None,
            sniff_on_connection_fail: false,
            sniff_interval_secs: None,
            randomize_hosts: true,
            max_retries: None,
            dead_timeout_secs: 60,
            max_dead_timeout_secs: 3600,
            connection_params: serde_json::Map::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TransportConfig {
    /// True if any sniff trigger is configured.
    pub fn sniffing_enabled(&self) -> bool {
        self.sniff_on_start
            || self.sniff_on_connection_fail
            || self.sniff_after_requests.is_some()
            || self.sniff_interval_secs.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    #[default]
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPoolKind {
    /// Applies sniffed topology.
    #[default]
    Sniffing,
    /// Fixed host list.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
    #[default]
    RoundRobin,
    StickyRoundRobin,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeadPoolKind {
    /// Flat `dead_timeout_secs`.
    #[default]
    Timeout,
    /// Doubling per consecutive failure, capped at `max_dead_timeout_secs`.
    Backoff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnifferKind {
    #[default]
    NodesInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    Json,
    #[default]
    Smart,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber at all.
    pub enabled: bool,

    /// Filter directive (trace, debug, info, warn, error, or `target=level`).
    pub level: String,

    /// `stderr`, `stdout`, or a file path.
    pub destination: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            destination: "stderr".to_string(),
        }
    }
}
