//! Topology discovery subsystem.
//!
//! # Data Flow
//! ```text
//! Trigger (start, every N requests, connection failure, interval)
//!     → Transport picks an alive connection
//!     → Sniffer::sniff(connection)   (nodes_info.rs)
//!     → ordered Vec<Host>
//!     → ConnectionPool::rebuild
//!
//! refresher.rs:
//!     Periodic timer → Transport::sniff → until shutdown
//! ```
//!
//! # Design Decisions
//! - Sniffing is advisory: any failure leaves the topology unchanged
//! - An empty node list is treated as a failure, never as "remove everyone"

pub mod nodes_info;
pub mod refresher;

use futures_util::future::BoxFuture;
use std::fmt;
use thiserror::Error;

use crate::connection::{Connection, ConnectionError, Host};

pub use nodes_info::NodesInfoSniffer;
pub use refresher::TopologyRefresher;

#[derive(Debug, Error)]
pub enum SniffError {
    #[error("sniff request failed: {0}")]
    Connection(#[from] ConnectionError),

    #[error("sniff request returned status {0}")]
    Status(u16),

    #[error("failed to parse node list: {0}")]
    Parse(String),

    #[error("cluster reported no usable nodes")]
    NoNodes,

    #[error("no alive connection to sniff from")]
    NoConnectionsAvailable,

    #[error("a sniff is already in progress")]
    InProgress,

    #[error("sniffed topology is not applied by this connection pool")]
    Disabled,
}

/// Queries one node for the cluster's current membership.
pub trait Sniffer: Send + Sync + fmt::Debug {
    fn sniff<'a>(&'a self, connection: &'a dyn Connection) -> BoxFuture<'a, Result<Vec<Host>, SniffError>>;
}
