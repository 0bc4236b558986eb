//! Connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! Transport asks for a connection
//!     → set.rs (load current connection snapshot, lock-free)
//!     → dead_pool.rs (drop dead hosts, keep probation-eligible ones)
//!     → prefer hosts not yet tried by this request
//!     → Selector picks one, DeadPool confirms the claim
//!     → Connection handed back to the transport
//!
//! Topology change (sniff or explicit host list):
//!     rebuild(hosts)
//!     → reuse existing connections by host, create the new ones
//!     → atomic swap of the whole set
//!     → prune dead entries for removed hosts
//! ```
//!
//! # Design Decisions
//! - Readers never lock: the set is an `ArcSwap` snapshot
//! - In-flight requests keep their `Arc<dyn Connection>` alive across a swap
//! - Pools are swapped wholesale; `static` ignores sniffed topology

pub mod dead_pool;
pub mod set;
pub mod sniffing;
pub mod static_pool;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::connection::{Connection, Host};
use crate::selector::NoConnectionsAvailable;

pub use dead_pool::{DeadEntry, DeadPool, NodeState, TimeoutDeadPool};
pub use set::{ConnectionSet, RebuildSummary};
pub use sniffing::SniffingConnectionPool;
pub use static_pool::StaticConnectionPool;

/// Owner of the connections, routing and health bookkeeping.
pub trait ConnectionPool: Send + Sync + fmt::Debug {
    /// Pick the next connection, avoiding `tried` while alternatives exist.
    fn next_connection(
        &self,
        tried: &HashSet<Host>,
    ) -> Result<Arc<dyn Connection>, NoConnectionsAvailable>;

    /// Replace the connection set with one connection per host.
    fn rebuild(&self, hosts: &[Host]) -> RebuildSummary;

    fn report_failure(&self, connection: &dyn Connection);

    fn report_success(&self, connection: &dyn Connection);

    /// Current connection snapshot.
    fn connections(&self) -> Arc<Vec<Arc<dyn Connection>>>;

    /// Connections currently eligible for selection, in pool order. Does not
    /// claim probation slots.
    fn alive_connections(&self) -> Vec<Arc<dyn Connection>>;

    fn dead_pool(&self) -> &dyn DeadPool;

    /// Whether topology discovered by sniffing should be applied.
    fn accepts_sniffed_topology(&self) -> bool;
}
