//! Sniffer reading the nodes-info HTTP endpoint.
//!
//! # Expected payload
//! ```text
//! { "nodes": { "<id>": { "http": { "publish_address": "10.0.0.1:9200" } } } }
//! ```
//! `publish_address` may also take the `hostname/ip:port` form, in which case
//! the hostname is used when present.

use axum::http::{Method, uri::PathAndQuery};
use futures_util::future::BoxFuture;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::connection::{Connection, Host, RawRequest};
use crate::sniffer::{SniffError, Sniffer};

pub const DEFAULT_SNIFF_PATH: &str = "/_nodes/_all/http";

#[derive(Debug, Deserialize)]
struct NodesInfo {
    #[serde(default)]
    nodes: BTreeMap<String, NodeInfo>,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    http: Option<HttpInfo>,
}

#[derive(Debug, Deserialize)]
struct HttpInfo {
    publish_address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NodesInfoSniffer {
    path: PathAndQuery,
}

impl NodesInfoSniffer {
    pub fn new() -> Self {
        Self {
            path: PathAndQuery::from_static(DEFAULT_SNIFF_PATH),
        }
    }

    pub fn with_path(path: PathAndQuery) -> Self {
        Self { path }
    }

    /// Parse a nodes-info body into host descriptors, ordered by node id.
    pub fn parse_nodes(body: &[u8]) -> Result<Vec<Host>, SniffError> {
        let info: NodesInfo =
            serde_json::from_slice(body).map_err(|e| SniffError::Parse(e.to_string()))?;

        let mut hosts = Vec::with_capacity(info.nodes.len());
        for (id, node) in info.nodes {
            let Some(address) = node.http.and_then(|h| h.publish_address) else {
                tracing::debug!(node = %id, "Node has no HTTP publish address, skipping");
                continue;
            };
            match parse_publish_address(&address) {
                Some(host) => hosts.push(host),
                None => tracing::warn!(node = %id, address = %address, "Unparseable publish address"),
            }
        }

        if hosts.is_empty() {
            return Err(SniffError::NoNodes);
        }
        Ok(hosts)
    }
}

impl Default for NodesInfoSniffer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_publish_address(address: &str) -> Option<Host> {
    let (hostname, addr) = match address.split_once('/') {
        Some((name, addr)) => (Some(name), addr),
        None => (None, address),
    };
    let ip_host: Host = addr.parse().ok()?;
    match hostname.filter(|n| !n.is_empty()) {
        Some(name) => {
            let named: Host = name.parse().ok()?;
            Some(Host::new(named.host(), ip_host.port()))
        }
        None => Some(ip_host),
    }
}

impl Sniffer for NodesInfoSniffer {
    fn sniff<'a>(&'a self, connection: &'a dyn Connection) -> BoxFuture<'a, Result<Vec<Host>, SniffError>> {
        Box::pin(async move {
            let request = RawRequest::new(Method::GET, self.path.clone());
            let response = connection.execute(request).await?;
            if !response.status.is_success() {
                return Err(SniffError::Status(response.status.as_u16()));
            }
            let hosts = Self::parse_nodes(&response.body)?;
            tracing::debug!(
                from = %connection.host(),
                nodes = hosts.len(),
                "Sniffed cluster topology"
            );
            Ok(hosts)
        })
    }
}
