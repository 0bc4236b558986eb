//! Node endpoint descriptor.
//!
//! # Accepted forms
//! - `host` (port left to the connection default)
//! - `host:port`
//! - `[v6addr]` / `[v6addr]:port`
//! - bare IPv6 literal without a port (more than one `:` and no brackets)
//!
//! # Design Decisions
//! - Hostnames are validated with `url::Host::parse` so a descriptor can always
//!   be turned into a base URL later.
//! - A malformed port (empty, non-numeric, out of range) is rejected here,
//!   before any network activity.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Port used when a descriptor does not carry one.
pub const DEFAULT_PORT: u16 = 9200;

/// Errors produced while parsing a host descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostParseError {
    #[error("empty host in '{0}'")]
    EmptyHost(String),

    #[error("invalid host '{input}': {reason}")]
    InvalidHost { input: String, reason: String },

    #[error("invalid port '{port}' in host '{input}'")]
    InvalidPort { input: String, port: String },
}

/// An immutable `{ host, port }` pair identifying one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Host {
    host: String,
    port: Option<u16>,
}

impl Host {
    /// Build a descriptor from already validated parts.
    pub fn new(host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Port to dial, falling back to [`DEFAULT_PORT`].
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    /// Base URL (`http://host:port/`) for this node.
    pub fn base_url(&self) -> Result<Url, url::ParseError> {
        let authority = if self.host.contains(':') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        Url::parse(&format!("http://{}:{}/", authority, self.port_or_default()))
    }

    /// Parse a list of host strings, failing on the first malformed entry.
    pub fn parse_all<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<Host>, HostParseError> {
        inputs.iter().map(|s| s.as_ref().parse()).collect()
    }
}

impl FromStr for Host {
    type Err = HostParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();

        let (raw_host, raw_port) = if let Some(rest) = trimmed.strip_prefix('[') {
            let end = rest.find(']').ok_or_else(|| HostParseError::InvalidHost {
                input: input.to_string(),
                reason: "missing closing ']'".to_string(),
            })?;
            let after = &rest[end + 1..];
            let port = match after.strip_prefix(':') {
                Some(p) => Some(p),
                None if after.is_empty() => None,
                None => {
                    return Err(HostParseError::InvalidHost {
                        input: input.to_string(),
                        reason: format!("unexpected '{}' after address", after),
                    })
                }
            };
            (&rest[..end], port)
        } else if trimmed.matches(':').count() > 1 {
            // Bare IPv6 literal, no port.
            (trimmed, None)
        } else {
            match trimmed.split_once(':') {
                Some((h, p)) => (h, Some(p)),
                None => (trimmed, None),
            }
        };

        if raw_host.is_empty() {
            return Err(HostParseError::EmptyHost(input.to_string()));
        }

        let port = match raw_port {
            None => None,
            Some(p) => Some(p.parse::<u16>().map_err(|_| HostParseError::InvalidPort {
                input: input.to_string(),
                port: p.to_string(),
            })?),
        };

        let host = if raw_host.contains(':') {
            url::Host::parse(&format!("[{}]", raw_host))
        } else {
            url::Host::parse(raw_host)
        }
        .map_err(|e| HostParseError::InvalidHost {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        let host = match host {
            url::Host::Domain(d) => d,
            url::Host::Ipv4(ip) => ip.to_string(),
            url::Host::Ipv6(ip) => ip.to_string(),
        };

        Ok(Host { host, port })
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let host: &str = &self.host;
        match (host.contains(':'), self.port) {
            (true, Some(port)) => write!(f, "[{}]:{}", host, port),
            (true, None) => write!(f, "[{}]", host),
            (false, Some(port)) => write!(f, "{}:{}", host, port),
            (false, None) => write!(f, "{}", host),
        }
    }
}
