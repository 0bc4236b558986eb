//! Transport construction.
//!
//! Every pluggable role (connection factory, selector, dead pool, sniffer,
//! serializer) is chosen by configuration and may be overridden with a custom
//! implementation before `build`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{
    ConfigError, ConnectionKind, ConnectionPoolKind, DeadPoolKind, SelectorKind, SerializerKind,
    SnifferKind, TransportConfig, ValidationError, validate_config,
};
use crate::connection::{ConnectionFactory, Host, HttpConnectionFactory, HttpConnectionParams};
use crate::pool::{
    ConnectionPool, ConnectionSet, DeadPool, SniffingConnectionPool, StaticConnectionPool,
    TimeoutDeadPool,
};
use crate::resilience::backoff::RevivePolicy;
use crate::selector::{RandomSelector, RoundRobinSelector, Selector, StickyRoundRobinSelector};
use crate::serializer::{JsonSerializer, Serializer, SmartSerializer};
use crate::sniffer::{NodesInfoSniffer, Sniffer};
use crate::transport::client::{SniffSettings, Transport};

#[derive(Debug)]
pub struct TransportBuilder {
    config: TransportConfig,
    connection_factory: Option<Arc<dyn ConnectionFactory>>,
    selector: Option<Box<dyn Selector>>,
    dead_pool: Option<Box<dyn DeadPool>>,
    sniffer: Option<Arc<dyn Sniffer>>,
    serializer: Option<Arc<dyn Serializer>>,
}

impl TransportBuilder {
    /// Start from defaults with the given seed hosts.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_config(TransportConfig {
            hosts: hosts.into_iter().map(Into::into).collect(),
            ..TransportConfig::default()
        })
    }

    pub fn from_config(config: TransportConfig) -> Self {
        Self {
            config,
            connection_factory: None,
            selector: None,
            dead_pool: None,
            sniffer: None,
            serializer: None,
        }
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = Some(retries);
        self
    }

    /// Base revive window of a dead node, in whole seconds.
    pub fn dead_timeout_secs(mut self, secs: u64) -> Self {
        self.config.dead_timeout_secs = secs;
        self
    }

    pub fn randomize_hosts(mut self, randomize: bool) -> Self {
        self.config.randomize_hosts = randomize;
        self
    }

    pub fn sniff_on_start(mut self, enabled: bool) -> Self {
        self.config.sniff_on_start = enabled;
        self
    }

    pub fn sniff_after_requests(mut self, requests: Option<u64>) -> Self {
        self.config.sniff_after_requests = requests;
        self
    }

    pub fn sniff_on_connection_fail(mut self, enabled: bool) -> Self {
        self.config.sniff_on_connection_fail = enabled;
        self
    }

    pub fn sniff_interval(mut self, interval: Option<Duration>) -> Self {
        self.config.sniff_interval_secs = interval.map(|d| d.as_secs());
        self
    }

    pub fn connection_pool(mut self, kind: ConnectionPoolKind) -> Self {
        self.config.connection_pool = kind;
        self
    }

    pub fn selector_kind(mut self, kind: SelectorKind) -> Self {
        self.config.selector = kind;
        self
    }

    pub fn dead_pool_kind(mut self, kind: DeadPoolKind) -> Self {
        self.config.dead_pool = kind;
        self
    }

    pub fn serializer_kind(mut self, kind: SerializerKind) -> Self {
        self.config.serializer = kind;
        self
    }

    pub fn connection_factory(mut self, factory: Arc<dyn ConnectionFactory>) -> Self {
        self.connection_factory = Some(factory);
        self
    }

    pub fn selector(mut self, selector: Box<dyn Selector>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn dead_pool(mut self, dead_pool: Box<dyn DeadPool>) -> Self {
        self.dead_pool = Some(dead_pool);
        self
    }

    pub fn sniffer(mut self, sniffer: Arc<dyn Sniffer>) -> Self {
        self.sniffer = Some(sniffer);
        self
    }

    pub fn serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// Validate everything and assemble the transport. No network I/O happens
    /// here.
    pub fn build(self) -> Result<Transport, ConfigError> {
        let config = self.config;
        let hosts = Host::parse_all(&config.hosts)?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        let factory: Arc<dyn ConnectionFactory> = match self.connection_factory {
            Some(factory) => factory,
            None => match config.connection {
                ConnectionKind::Http => {
                    let params = HttpConnectionParams::from_params(&config.connection_params)
                        .map_err(|e| {
                            ConfigError::Validation(vec![ValidationError::InvalidConnectionParams(
                                e.to_string(),
                            )])
                        })?;
                    Arc::new(HttpConnectionFactory::new(params))
                }
            },
        };

        let selector: Box<dyn Selector> = match self.selector {
            Some(selector) => selector,
            None => match config.selector {
                SelectorKind::RoundRobin => Box::new(RoundRobinSelector::new()),
                SelectorKind::StickyRoundRobin => Box::new(StickyRoundRobinSelector::new()),
                SelectorKind::Random => Box::new(RandomSelector::new()),
            },
        };

        let dead_timeout = Duration::from_secs(config.dead_timeout_secs);
        let dead_pool: Box<dyn DeadPool> = match self.dead_pool {
            Some(dead_pool) => dead_pool,
            None => {
                let policy = match config.dead_pool {
                    DeadPoolKind::Timeout => RevivePolicy::Flat,
                    DeadPoolKind::Backoff => RevivePolicy::Exponential {
                        max: Duration::from_secs(config.max_dead_timeout_secs),
                    },
                };
                Box::new(TimeoutDeadPool::with_policy(dead_timeout, policy))
            }
        };

        let sniffer: Arc<dyn Sniffer> = match self.sniffer {
            Some(sniffer) => sniffer,
            None => match config.sniffer {
                SnifferKind::NodesInfo => Arc::new(NodesInfoSniffer::new()),
            },
        };

        let serializer: Arc<dyn Serializer> = match self.serializer {
            Some(serializer) => serializer,
            None => match config.serializer {
                SerializerKind::Json => Arc::new(JsonSerializer::new()),
                SerializerKind::Smart => Arc::new(SmartSerializer::new()),
            },
        };

        let set = ConnectionSet::new(&hosts, factory, selector, dead_pool, config.randomize_hosts);
        let pool: Arc<dyn ConnectionPool> = match config.connection_pool {
            ConnectionPoolKind::Sniffing => Arc::new(SniffingConnectionPool::new(set)),
            ConnectionPoolKind::Static => Arc::new(StaticConnectionPool::new(set)),
        };

        let sniff = SniffSettings {
            on_start: config.sniff_on_start,
            after_requests: config.sniff_after_requests,
            on_connection_fail: config.sniff_on_connection_fail,
            interval: config.sniff_interval_secs.map(Duration::from_secs),
        };

        tracing::info!(
            hosts = hosts.len(),
            pool = ?config.connection_pool,
            selector = ?config.selector,
            dead_pool = ?config.dead_pool,
            max_retries = ?config.max_retries,
            "Transport initialized"
        );

        Ok(Transport::from_parts(pool, sniffer, serializer, config.max_retries, sniff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::HostParseError;

    #[test]
    fn test_malformed_port_fails_before_io() {
        let err = TransportBuilder::new(["a:9200", "b:"]).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidHost(HostParseError::InvalidPort { .. })
        ));
        assert!(err.to_string().contains("b:"));
    }

    #[test]
    fn test_build_from_hosts() {
        let transport = TransportBuilder::new(["a:9200", "b", "[::1]:9201"])
            .randomize_hosts(false)
            .build()
            .unwrap();
        let hosts: Vec<String> = transport.hosts().iter().map(ToString::to_string).collect();
        assert_eq!(hosts, vec!["a:9200", "b", "[::1]:9201"]);
    }

    #[test]
    fn test_dead_timeout_in_seconds() {
        assert!(TransportBuilder::new(["a"]).dead_timeout_secs(5).build().is_ok());
        let err = TransportBuilder::new(["a"]).dead_timeout_secs(0).build().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ref errors) if matches!(errors[..], [ValidationError::ZeroDeadTimeout])
        ));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let err = TransportBuilder::new(["a"])
            .connection_pool(ConnectionPoolKind::Static)
            .sniff_on_start(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
